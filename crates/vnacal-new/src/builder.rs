//! Validation, port mapping and equation emission for one standard.
//!
//! [`build`] turns the caller's compact argument matrices into a
//! [`Measurement`]: full-size M and S matrices in VNA port order, the
//! connectivity of the standard's ports and the equations it contributes.
//! Nothing is returned unless every step succeeds.

use nalgebra::DMatrix;
use num_complex::Complex64 as C64;
use vnacal_core::{
    CalType, CalibrationConfig, Coefficient, Layout, Leakage, ParameterId, ParameterMatrix,
    ParameterStore, SeriesMatrix, Shape, Terms,
};
use vnacal_linalg::mrdivide;

use crate::connectivity::Connectivity;
use crate::equation::{Cell, Equation, EquationKind, Term};
use crate::error::{Error, Result};
use crate::measurement::{Measurement, StandardKind};

/// Caller arguments describing one standard.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StandardArgs<'a> {
    pub kind: StandardKind,
    pub a: Option<&'a SeriesMatrix>,
    pub b: &'a SeriesMatrix,
    pub s: &'a ParameterMatrix,
    pub port_map: Option<&'a [usize]>,
}

/// Session state a standard is built against.
pub(crate) struct Context<'a, P> {
    /// Layout the equations are generated with.
    pub layout: &'a Layout,
    pub frequencies: &'a [f64],
    pub store: &'a P,
    pub config: &'a CalibrationConfig,
}

/// Validate a standard and generate its equations.
pub(crate) fn build<P: ParameterStore>(
    ctx: &Context<'_, P>,
    args: &StandardArgs<'_>,
) -> Result<Measurement> {
    let function = args.kind.function();
    let layout = ctx.layout;
    let cal_type = layout.cal_type();
    let (m_rows, m_columns, s_ports) = (layout.m_rows(), layout.m_columns(), layout.s_ports());

    let n = check_s_shape(function, cal_type, args.s.shape())?;
    let ports = resolve_ports(function, args.port_map, n, s_ports)?;
    let mut sorted = ports.clone();
    sorted.sort_unstable();

    // Mapping of B cells onto M cells.
    let row_ports: Vec<usize> = sorted.iter().copied().filter(|&p| p < m_rows).collect();
    let column_ports: Vec<usize> = sorted.iter().copied().filter(|&p| p < m_columns).collect();
    let b_cells: Vec<(usize, usize)> = match args.b.shape() {
        Shape::Full { rows, columns } => {
            if rows != row_ports.len() || columns != column_ports.len() {
                return Err(Error::usage(
                    function,
                    format!(
                        "B must be {}x{} for this port assignment, got {}x{}",
                        row_ports.len(),
                        column_ports.len(),
                        rows,
                        columns
                    ),
                ));
            }
            (0..rows * columns)
                .map(|k| (row_ports[k / columns], column_ports[k % columns]))
                .collect()
        }
        Shape::Diagonal(len) => {
            let diagonal: Vec<usize> = sorted
                .iter()
                .copied()
                .filter(|&p| p < m_rows && p < m_columns)
                .collect();
            if len != diagonal.len() {
                return Err(Error::usage(
                    function,
                    format!(
                        "diagonal B must have {} entries for this port assignment, got {}",
                        diagonal.len(),
                        len
                    ),
                ));
            }
            diagonal.into_iter().map(|p| (p, p)).collect()
        }
    };
    if b_cells.is_empty() {
        return Err(Error::usage(function, "standard has no measured cells"));
    }

    let frequencies = ctx.frequencies.len();
    check_series(function, "B", args.b, frequencies)?;
    let series = compute_m(function, cal_type.is_per_column(), args.a, args.b, frequencies)?;

    let mut m: Vec<Option<Vec<C64>>> = Vec::new();
    m.try_reserve_exact(m_rows * m_columns)?;
    m.resize(m_rows * m_columns, None);
    for ((row, column), values) in b_cells.into_iter().zip(series) {
        m[row * m_columns + column] = Some(values);
    }

    let s = fill_s(args.s, &ports, s_ports)?;
    check_parameters(ctx, function, args.s)?;
    if cal_type.is_full() && s.iter().any(Option::is_none) {
        return Err(Error::NeedFullS {
            function,
            cal_type,
            suggestion: args.kind.full_s_suggestion(),
        });
    }

    let connectivity = (!cal_type.is_full()).then(|| Connectivity::from_s(&s, s_ports));
    let measured: Vec<bool> = m.iter().map(Option::is_some).collect();
    let grid = Grid {
        m_rows,
        m_columns,
        s_ports,
        measured: &measured,
        s: &s,
    };
    let equations = emit_equations(layout, &grid, connectivity.as_ref())?;

    Ok(Measurement {
        kind: args.kind,
        ports,
        m_rows,
        m_columns,
        s_ports,
        m,
        s,
        connectivity,
        equations,
    })
}

/// Check S against the completeness rule of `cal_type` and return the
/// number of ports of the standard.
fn check_s_shape(function: &'static str, cal_type: CalType, shape: Shape) -> Result<usize> {
    let n = match shape {
        Shape::Full { rows, columns } => rows.max(columns),
        Shape::Diagonal(n) => n,
    };
    if n == 0 {
        return Err(Error::usage(function, "S matrix is empty"));
    }
    if let Shape::Full { rows, columns } = shape {
        if rows == 0 || columns == 0 {
            return Err(Error::usage(
                function,
                format!("S matrix is empty, got {}x{}", rows, columns),
            ));
        }
        let (complete, needed) = if cal_type.is_full() {
            (rows == n && columns == n, "square")
        } else if cal_type.is_transfer() {
            (rows == n, "complete columns")
        } else {
            (columns == n, "complete rows")
        };
        if !complete {
            return Err(Error::usage(
                function,
                format!(
                    "{} calibration needs an S matrix with {}, got {}x{}",
                    cal_type, needed, rows, columns
                ),
            ));
        }
    }
    Ok(n)
}

/// Resolve the 1-based port map into 0-based VNA ports.
fn resolve_ports(
    function: &'static str,
    port_map: Option<&[usize]>,
    n: usize,
    s_ports: usize,
) -> Result<Vec<usize>> {
    let Some(map) = port_map else {
        if n > s_ports {
            return Err(Error::usage(
                function,
                format!("{}-port standard exceeds the {} calibration ports", n, s_ports),
            ));
        }
        return Ok((0..n).collect());
    };

    if map.len() != n {
        return Err(Error::usage(
            function,
            format!("port map has {} entries for a {}-port standard", map.len(), n),
        ));
    }
    let mut seen = vec![false; s_ports];
    let mut ports = Vec::with_capacity(n);
    for &port in map {
        if port == 0 || port > s_ports {
            return Err(Error::usage(
                function,
                format!("port {} out of range 1..={}", port, s_ports),
            ));
        }
        if seen[port - 1] {
            return Err(Error::usage(function, format!("port {} mapped twice", port)));
        }
        seen[port - 1] = true;
        ports.push(port - 1);
    }
    Ok(ports)
}

fn check_series(
    function: &'static str,
    name: &str,
    matrix: &SeriesMatrix,
    frequencies: usize,
) -> Result<()> {
    match matrix.frequencies() {
        Some(n) if n == frequencies => Ok(()),
        _ => Err(Error::usage(
            function,
            format!("every cell of {} must hold {} frequency points", name, frequencies),
        )),
    }
}

/// Compute M in B's storage order.
///
/// Without A, M is B. A full `b_columns × b_columns` A gives `M = B·A⁻¹`
/// per frequency. Per-column types may instead give A as a row vector that
/// divides each column of B, and a diagonal A divides a diagonal B
/// element-wise.
fn compute_m(
    function: &'static str,
    per_column: bool,
    a: Option<&SeriesMatrix>,
    b: &SeriesMatrix,
    frequencies: usize,
) -> Result<Vec<Vec<C64>>> {
    let Some(a) = a else {
        let mut m = Vec::new();
        m.try_reserve_exact(b.cells().len())?;
        m.extend(b.cells().iter().cloned());
        return Ok(m);
    };
    check_series(function, "A", a, frequencies)?;

    let b_columns = b.shape().columns();
    match (a.shape(), b.shape()) {
        (Shape::Full { rows, columns }, Shape::Full { .. })
            if rows == b_columns && columns == b_columns =>
        {
            let mut m: Vec<Vec<C64>> = Vec::new();
            m.try_reserve_exact(b.cells().len())?;
            for _ in 0..b.cells().len() {
                let mut series = Vec::new();
                series.try_reserve_exact(frequencies)?;
                m.push(series);
            }
            for findex in 0..frequencies {
                let x: DMatrix<C64> = match mrdivide(&b.at(findex), a.at(findex)) {
                    Ok((x, _)) => x,
                    Err(vnacal_linalg::Error::SingularMatrix) => {
                        return Err(Error::SingularMatrix { function, findex });
                    }
                    Err(e) => return Err(e.into()),
                };
                for (k, series) in m.iter_mut().enumerate() {
                    let (i, j) = b.shape().cell(k);
                    series.push(x[(i, j)]);
                }
            }
            Ok(m)
        }
        (Shape::Full { rows: 1, columns }, Shape::Full { .. })
            if per_column && columns == b_columns =>
        {
            check_divisors(function, a.cells(), frequencies)?;
            Ok(b.iter()
                .map(|(_, j, values)| divide(values, &a.cells()[j]))
                .collect())
        }
        (Shape::Diagonal(n), Shape::Diagonal(len)) if n == len => {
            check_divisors(function, a.cells(), frequencies)?;
            Ok(b.cells()
                .iter()
                .zip(a.cells())
                .map(|(values, divisor)| divide(values, divisor))
                .collect())
        }
        (shape, _) => Err(Error::usage(
            function,
            format!(
                "A ({}x{}) does not fit B ({}x{})",
                shape.rows(),
                shape.columns(),
                b.shape().rows(),
                b.shape().columns()
            ),
        )),
    }
}

/// Fail at the first frequency where some divisor is zero.
fn check_divisors(
    function: &'static str,
    divisors: &[Vec<C64>],
    frequencies: usize,
) -> Result<()> {
    for findex in 0..frequencies {
        if divisors.iter().any(|d| d[findex] == C64::new(0.0, 0.0)) {
            return Err(Error::SingularMatrix { function, findex });
        }
    }
    Ok(())
}

fn divide(values: &[C64], divisors: &[C64]) -> Vec<C64> {
    values.iter().zip(divisors).map(|(v, d)| v / d).collect()
}

/// Place the standard's S matrix into the full port set.
///
/// Cells between two ports of a diagonal S, and cells between a port of the
/// standard and a port outside it, are known to be zero. Cells between two
/// ports outside the standard stay unknown.
fn fill_s(
    s: &ParameterMatrix,
    ports: &[usize],
    s_ports: usize,
) -> Result<Vec<Option<ParameterId>>> {
    let mut full: Vec<Option<ParameterId>> = Vec::new();
    full.try_reserve_exact(s_ports * s_ports)?;
    full.resize(s_ports * s_ports, None);

    for (i, j, &id) in s.iter() {
        full[ports[i] * s_ports + ports[j]] = Some(id);
    }
    if s.shape().is_diagonal() {
        for &p in ports {
            for &q in ports {
                if p != q {
                    full[p * s_ports + q] = Some(ParameterId::ZERO);
                }
            }
        }
    }

    let mut mapped = vec![false; s_ports];
    for &p in ports {
        mapped[p] = true;
    }
    for p in (0..s_ports).filter(|&p| mapped[p]) {
        for q in (0..s_ports).filter(|&q| !mapped[q]) {
            full[p * s_ports + q] = Some(ParameterId::ZERO);
            full[q * s_ports + p] = Some(ParameterId::ZERO);
        }
    }
    Ok(full)
}

/// Every parameter must exist and cover the calibration frequencies.
fn check_parameters<P: ParameterStore>(
    ctx: &Context<'_, P>,
    function: &'static str,
    s: &ParameterMatrix,
) -> Result<()> {
    let mut ids: Vec<ParameterId> = s.cells().to_vec();
    ids.sort_unstable();
    ids.dedup();

    let (fmin, fmax) = match (ctx.frequencies.first(), ctx.frequencies.last()) {
        (Some(&lo), Some(&hi)) => (lo, hi),
        _ => return Ok(()),
    };
    for id in ids {
        match ctx.store.frequency_range(id) {
            Err(source) => {
                return Err(Error::Parameter {
                    function,
                    id,
                    source,
                });
            }
            Ok(Some((low, high))) if !ctx.config.covers((low, high), fmin, fmax) => {
                return Err(Error::FrequencyRange {
                    function,
                    id,
                    low,
                    high,
                    fmin,
                    fmax,
                });
            }
            Ok(_) => {}
        }
    }
    Ok(())
}

/// Full-size M availability and S contents of a standard.
struct Grid<'a> {
    m_rows: usize,
    m_columns: usize,
    s_ports: usize,
    measured: &'a [bool],
    s: &'a [Option<ParameterId>],
}

impl Grid<'_> {
    fn is_measured(&self, cell: Cell) -> bool {
        self.measured[cell.row * self.m_columns + cell.column]
    }

    fn s(&self, cell: Cell) -> Option<ParameterId> {
        self.s[cell.row * self.s_ports + cell.column]
    }
}

/// Terms of one equation under construction.
struct TermList<'a> {
    grid: &'a Grid<'a>,
    leakage: Option<Leakage>,
    terms: Vec<Term>,
    /// Cleared when a term needs a cell the standard did not supply.
    complete: bool,
}

impl<'a> TermList<'a> {
    fn new(grid: &'a Grid<'a>, leakage: Option<Leakage>) -> Self {
        Self {
            grid,
            leakage,
            terms: Vec::new(),
            complete: true,
        }
    }

    fn add(
        &mut self,
        coefficient: Coefficient,
        negative: bool,
        measured: Option<Cell>,
        parameter: Option<Cell>,
    ) {
        let coefficient = match coefficient {
            Coefficient::Zero => return,
            Coefficient::One => None,
            Coefficient::Unknown(k) => Some(k),
        };
        if let Some(cell) = parameter {
            match self.grid.s(cell) {
                Some(id) if id.is_zero() => return,
                Some(_) => {}
                None => {
                    self.complete = false;
                    return;
                }
            }
        }
        if measured.is_some_and(|cell| !self.grid.is_measured(cell)) {
            self.complete = false;
            return;
        }
        let leakage = match (measured, self.leakage) {
            (Some(cell), Some(l)) => l.index(cell.row, cell.column),
            _ => None,
        };
        self.terms.push(Term {
            coefficient,
            negative,
            measured,
            leakage,
            parameter,
        });
    }

    fn finish(self) -> Option<Vec<Term>> {
        (self.complete && !self.terms.is_empty()).then_some(self.terms)
    }
}

/// Terms of the error-term equation at cell (`i`, `j`), or `None` if the
/// standard does not determine it.
fn cell_terms(
    grid: &Grid<'_>,
    terms: &Terms,
    leakage: Option<Leakage>,
    i: usize,
    j: usize,
) -> Option<Vec<Term>> {
    let (m_rows, m_columns, s_ports) = (grid.m_rows, grid.m_columns, grid.s_ports);
    let mut list = TermList::new(grid, leakage);
    let cell = Cell::new;

    match terms {
        Terms::T { ts, ti, tx, tm } => {
            // Ts·S + Ti - M·Tx·S - M·Tm
            for k in 0..s_ports {
                list.add(ts.coefficient(i, k), false, None, Some(cell(k, j)));
            }
            list.add(ti.coefficient(i, j), false, None, None);
            for k in 0..m_columns {
                for l in 0..s_ports {
                    list.add(tx.coefficient(k, l), true, Some(cell(i, k)), Some(cell(l, j)));
                }
            }
            for k in 0..m_columns {
                list.add(tm.coefficient(k, j), true, Some(cell(i, k)), None);
            }
        }
        Terms::U { um, ui, ux, us } => {
            // Um·M + Ui - S·Ux·M - S·Us
            for k in 0..m_rows {
                list.add(um.coefficient(i, k), false, Some(cell(k, j)), None);
            }
            list.add(ui.coefficient(i, j), false, None, None);
            for k in 0..s_ports {
                for l in 0..m_rows {
                    list.add(ux.coefficient(k, l), true, Some(cell(l, j)), Some(cell(i, k)));
                }
            }
            for k in 0..s_ports {
                list.add(us.coefficient(k, j), true, None, Some(cell(i, k)));
            }
        }
        Terms::E12 { .. } => unreachable!("E12 equations are built with the UE14 layout"),
    }
    list.finish()
}

/// Generate the equations of every system for one standard.
fn emit_equations(
    layout: &Layout,
    grid: &Grid<'_>,
    connectivity: Option<&Connectivity>,
) -> Result<Vec<Equation>> {
    let per_column = layout.cal_type().is_per_column();
    let (rows, columns) = layout.equation_shape();
    let connected = |i: usize, j: usize| connectivity.is_none_or(|c| c.is_connected(i, j));
    let mut equations = Vec::new();

    for system in 0..layout.systems() {
        let terms = layout.terms(system);
        let leakage = layout.leakage(system);

        for i in 0..rows {
            for j in 0..columns {
                if (per_column && j != system) || !connected(i, j) {
                    continue;
                }
                if let Some(terms) = cell_terms(grid, &terms, leakage, i, j) {
                    equations.try_reserve(1)?;
                    equations.push(Equation {
                        row: i,
                        column: j,
                        system,
                        kind: EquationKind::ErrorTerm,
                        terms,
                    });
                }
            }
        }

        // Leakage is observable only between ports the standard isolates.
        let Some(leakage) = leakage else { continue };
        for i in 0..layout.m_rows() {
            for j in 0..layout.m_columns() {
                let Some(index) = leakage.index(i, j) else {
                    continue;
                };
                if !grid.is_measured(Cell::new(i, j)) || connected(i, j) {
                    continue;
                }
                equations.try_reserve(1)?;
                equations.push(Equation {
                    row: i,
                    column: j,
                    system,
                    kind: EquationKind::Leakage,
                    terms: vec![
                        Term {
                            coefficient: Some(index),
                            negative: false,
                            measured: None,
                            leakage: None,
                            parameter: None,
                        },
                        Term {
                            coefficient: None,
                            negative: true,
                            measured: Some(Cell::new(i, j)),
                            leakage: None,
                            parameter: None,
                        },
                    ],
                });
            }
        }
    }
    Ok(equations)
}
