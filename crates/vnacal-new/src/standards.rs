//! Convenience adders for common standards.
//!
//! Each adder builds the argument matrices for its standard and forwards to
//! [`NewCalibration::add_common`]. Ports are 1-based.

use num_complex::Complex64 as C64;
use vnacal_core::{ParameterId, ParameterMatrix, ParameterStore, SeriesMatrix};

use crate::error::Result;
use crate::measurement::StandardKind;
use crate::session::NewCalibration;

impl<P: ParameterStore> NewCalibration<P> {
    /// Add a one-port reflect with reflection coefficient `s` on `port`.
    ///
    /// `b` is the measured reflection at each frequency, or the raw
    /// reflected wave if `a` holds the incident wave.
    pub fn add_single_reflect(
        &mut self,
        a: Option<&[C64]>,
        b: &[C64],
        s: ParameterId,
        port: usize,
    ) -> Result<usize> {
        let a = a.map(|a| SeriesMatrix::diagonal(vec![a.to_vec()]));
        let b = SeriesMatrix::diagonal(vec![b.to_vec()]);
        let s = ParameterMatrix::diagonal(vec![s]);
        self.add_common(
            StandardKind::SingleReflect,
            a.as_ref(),
            &b,
            &s,
            Some(&[port][..]),
        )
    }

    /// Add a pair of reflects, `s11` on `port1` and `s22` on `port2`,
    /// measured together.
    pub fn add_double_reflect(
        &mut self,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        s11: ParameterId,
        s22: ParameterId,
        port1: usize,
        port2: usize,
    ) -> Result<usize> {
        let s = ParameterMatrix::diagonal(vec![s11, s22]);
        self.add_common(
            StandardKind::DoubleReflect,
            a,
            b,
            &s,
            Some(&[port1, port2][..]),
        )
    }

    /// Add a perfect through between `port1` and `port2`.
    pub fn add_through(
        &mut self,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        port1: usize,
        port2: usize,
    ) -> Result<usize> {
        let s = ParameterMatrix::full(
            2,
            2,
            vec![
                ParameterId::ZERO,
                ParameterId::ONE,
                ParameterId::ONE,
                ParameterId::ZERO,
            ],
        )?;
        self.add_common(StandardKind::Through, a, b, &s, Some(&[port1, port2][..]))
    }

    /// Add a two-port line with parameters `s` (`s11 s12 s21 s22`) between
    /// `port1` and `port2`.
    pub fn add_line(
        &mut self,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        s: &[ParameterId; 4],
        port1: usize,
        port2: usize,
    ) -> Result<usize> {
        let s = ParameterMatrix::full(2, 2, s.to_vec())?;
        self.add_common(StandardKind::Line, a, b, &s, Some(&[port1, port2][..]))
    }

    /// Add an arbitrary standard occupying the first ports of the VNA.
    pub fn add_matrix(
        &mut self,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        s: &ParameterMatrix,
    ) -> Result<usize> {
        self.add_common(StandardKind::Matrix, a, b, s, None)
    }

    /// Add an arbitrary standard whose port `k` connects to VNA port
    /// `port_map[k]`.
    pub fn add_mapped_matrix(
        &mut self,
        a: Option<&SeriesMatrix>,
        b: &SeriesMatrix,
        s: &ParameterMatrix,
        port_map: &[usize],
    ) -> Result<usize> {
        self.add_common(StandardKind::MappedMatrix, a, b, s, Some(port_map))
    }
}
