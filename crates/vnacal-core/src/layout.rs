//! Layout of the unknown-coefficient vector.
//!
//! Each error-term type arranges its unknowns as four blocks (`Ts Ti Tx Tm`
//! for the T form, `Um Ui Ux Us` for the U form), followed by the leakage
//! terms if the type has any. A [`Layout`] maps block cells to positions in
//! the flat coefficient vector of a system.
//!
//! One entry of the `Tm` (T form) or `Um` (U form) block, cell (0,0), is not
//! an unknown: it is fixed to 1 to remove the scale ambiguity of the
//! homogeneous system. The remaining entries of that block shift down by one.
//!
//! Block order within a system:
//!
//! ```text
//!  T form:  ts ti tx tm* [leakage]
//!  U form:  um* ui ux us [leakage]
//! ```
//!
//! where `*` marks the normalized block.

use crate::cal_type::{CalType, Form};
use crate::error::{Error, Result};

/// What occupies a cell of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coefficient {
    /// Index into the system's unknown vector.
    Unknown(usize),
    /// The normalized entry, fixed to 1.
    One,
    /// Structurally zero.
    Zero,
}

/// Sparsity pattern of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockShape {
    /// Every cell is an unknown, numbered row-major.
    Full,
    /// Only cells on the main diagonal are unknowns.
    Diagonal,
    /// A single cell is an unknown.
    Single { row: usize, column: usize },
}

/// One family of error terms, e.g. `Tx`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    offset: usize,
    rows: usize,
    columns: usize,
    shape: BlockShape,
    normalized: bool,
}

impl Block {
    /// Block of `rows × columns` unknowns starting at `offset`.
    pub fn full(offset: usize, rows: usize, columns: usize) -> Self {
        Self {
            offset,
            rows,
            columns,
            shape: BlockShape::Full,
            normalized: false,
        }
    }

    /// Diagonal block with `min(rows, columns)` unknowns.
    pub fn diagonal(offset: usize, rows: usize, columns: usize) -> Self {
        Self {
            offset,
            rows,
            columns,
            shape: BlockShape::Diagonal,
            normalized: false,
        }
    }

    /// Block whose only unknown sits at (`row`, `column`).
    pub fn single(offset: usize, rows: usize, columns: usize, row: usize, column: usize) -> Self {
        Self {
            offset,
            rows,
            columns,
            shape: BlockShape::Single { row, column },
            normalized: false,
        }
    }

    /// Fix the first structural entry to 1.
    fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }

    /// Index of the first unknown of this block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> BlockShape {
        self.shape
    }

    /// True if cell (0,0) is fixed to 1.
    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    /// Number of structurally nonzero cells.
    pub fn entries(&self) -> usize {
        match self.shape {
            BlockShape::Full => self.rows * self.columns,
            BlockShape::Diagonal => self.rows.min(self.columns),
            BlockShape::Single { .. } => 1,
        }
    }

    /// Number of unknowns the block contributes.
    pub fn len(&self) -> usize {
        self.entries() - usize::from(self.normalized)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coefficient at (`row`, `column`) of the block.
    pub fn coefficient(&self, row: usize, column: usize) -> Coefficient {
        if row >= self.rows || column >= self.columns {
            return Coefficient::Zero;
        }
        let entry = match self.shape {
            BlockShape::Full => row * self.columns + column,
            BlockShape::Diagonal if row == column => row,
            BlockShape::Single { row: r, column: c } if (row, column) == (r, c) => 0,
            _ => return Coefficient::Zero,
        };
        match (self.normalized, entry) {
            (true, 0) => Coefficient::One,
            (true, e) => Coefficient::Unknown(self.offset + e - 1),
            (false, e) => Coefficient::Unknown(self.offset + e),
        }
    }
}

/// The four error-term blocks of one system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terms {
    /// `Ts·S + Ti = M·Tx·S + M·Tm`
    T {
        ts: Block,
        ti: Block,
        tx: Block,
        tm: Block,
    },
    /// `Um·M + Ui = S·Ux·M + S·Us`
    U {
        um: Block,
        ui: Block,
        ux: Block,
        us: Block,
    },
    /// Directivity/leakage, reflection tracking and source match of the
    /// 12-term model, each `m_rows × m_columns`.
    E12 { el: Block, er: Block, em: Block },
}

impl Terms {
    /// Blocks in coefficient order.
    pub fn blocks(&self) -> Vec<Block> {
        match *self {
            Terms::T { ts, ti, tx, tm } => vec![ts, ti, tx, tm],
            Terms::U { um, ui, ux, us } => vec![um, ui, ux, us],
            Terms::E12 { el, er, em } => vec![el, er, em],
        }
    }

    /// Total number of unknowns in the blocks.
    pub fn len(&self) -> usize {
        self.blocks().iter().map(Block::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Leakage unknowns of one system.
///
/// Leakage terms are the off-diagonal cells of the measurement matrix, or,
/// for per-column types, the off-diagonal cells of a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leakage {
    offset: usize,
    rows: usize,
    columns: usize,
    column: Option<usize>,
}

impl Leakage {
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of leakage unknowns.
    pub fn len(&self) -> usize {
        match self.column {
            Some(j) => self.rows - usize::from(j < self.rows),
            None => self.rows * self.columns - self.rows.min(self.columns),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coefficient index of the leakage from driver `column` into
    /// detector `row`, if that cell has one.
    pub fn index(&self, row: usize, column: usize) -> Option<usize> {
        if row == column || row >= self.rows || column >= self.columns {
            return None;
        }
        match self.column {
            Some(j) if j != column => None,
            Some(j) => Some(self.offset + row - usize::from(row > j && j < self.rows)),
            None => {
                let diagonal_before =
                    row.min(self.rows.min(self.columns)) + usize::from(row < column);
                Some(self.offset + row * self.columns + column - diagonal_before)
            }
        }
    }
}

/// Coefficient layout of a calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    cal_type: CalType,
    m_rows: usize,
    m_columns: usize,
}

impl Layout {
    /// Layout for `cal_type` with `m_rows` detector ports and `m_columns`
    /// driver ports.
    ///
    /// T types need `m_rows <= m_columns` and U types `m_columns <= m_rows`;
    /// otherwise the error-term model has no inverse.
    pub fn new(cal_type: CalType, m_rows: usize, m_columns: usize) -> Result<Self> {
        if m_rows == 0 || m_columns == 0 {
            return Err(Error::InvalidDimensions(format!(
                "{} calibration needs at least one detector and one driver port, got {}x{}",
                cal_type, m_rows, m_columns
            )));
        }
        // Tx·S + Tm (T form) or Um - S·Ux (U form) must be square.
        let (square, needed) = match cal_type.form() {
            Form::T => (m_rows <= m_columns, "detector ports <= driver ports"),
            Form::U => (m_columns <= m_rows, "driver ports <= detector ports"),
        };
        if !square {
            return Err(Error::InvalidDimensions(format!(
                "{} calibration needs {}, got {}x{}",
                cal_type, needed, m_rows, m_columns
            )));
        }
        Ok(Self {
            cal_type,
            m_rows,
            m_columns,
        })
    }

    pub fn cal_type(&self) -> CalType {
        self.cal_type
    }

    /// Number of detector ports (rows of M).
    pub fn m_rows(&self) -> usize {
        self.m_rows
    }

    /// Number of driver ports (columns of M).
    pub fn m_columns(&self) -> usize {
        self.m_columns
    }

    /// Number of reference ports (dimension of S).
    pub fn s_ports(&self) -> usize {
        self.m_rows.max(self.m_columns)
    }

    /// Layout used to generate equations.
    ///
    /// `E12` calibrations are built as `UE14`; every other type builds its
    /// own equations.
    pub fn equations(&self) -> Layout {
        Layout {
            cal_type: self.cal_type.equation_type(),
            ..*self
        }
    }

    /// Number of independent systems of unknowns.
    pub fn systems(&self) -> usize {
        match self.cal_type {
            CalType::UE14 => self.m_columns,
            _ => 1,
        }
    }

    /// Rows and columns of the per-cell equation grid.
    ///
    /// T-form equations are indexed by (M row, S column), U-form equations
    /// by (S row, M column).
    pub fn equation_shape(&self) -> (usize, usize) {
        match self.cal_type.form() {
            Form::T => (self.m_rows, self.s_ports()),
            Form::U => (self.s_ports(), self.m_columns),
        }
    }

    /// Error-term blocks of `system`.
    pub fn terms(&self, system: usize) -> Terms {
        let (r, c, s) = (self.m_rows, self.m_columns, self.s_ports());
        match self.cal_type {
            CalType::T8 | CalType::TE10 => {
                let ts = Block::diagonal(0, r, s);
                let ti = Block::diagonal(ts.offset + ts.len(), r, s);
                let tx = Block::diagonal(ti.offset + ti.len(), c, s);
                let tm = Block::diagonal(tx.offset + tx.len(), c, s).normalized();
                Terms::T { ts, ti, tx, tm }
            }
            CalType::T16 => {
                let ts = Block::full(0, r, s);
                let ti = Block::full(ts.offset + ts.len(), r, s);
                let tx = Block::full(ti.offset + ti.len(), c, s);
                let tm = Block::full(tx.offset + tx.len(), c, s).normalized();
                Terms::T { ts, ti, tx, tm }
            }
            CalType::U8 | CalType::UE10 => {
                let um = Block::diagonal(0, s, r).normalized();
                let ui = Block::diagonal(um.offset + um.len(), s, c);
                let ux = Block::diagonal(ui.offset + ui.len(), s, r);
                let us = Block::diagonal(ux.offset + ux.len(), s, c);
                Terms::U { um, ui, ux, us }
            }
            CalType::U16 => {
                let um = Block::full(0, s, r).normalized();
                let ui = Block::full(um.offset + um.len(), s, c);
                let ux = Block::full(ui.offset + ui.len(), s, r);
                let us = Block::full(ux.offset + ux.len(), s, c);
                Terms::U { um, ui, ux, us }
            }
            CalType::UE14 => {
                let um = Block::diagonal(0, s, r).normalized();
                let ui = Block::single(um.offset + um.len(), s, c, system, system);
                let ux = Block::diagonal(ui.offset + ui.len(), s, r);
                let us = Block::single(ux.offset + ux.len(), s, c, system, system);
                Terms::U { um, ui, ux, us }
            }
            CalType::E12 => {
                let n = r * c;
                Terms::E12 {
                    el: Block::full(0, r, c),
                    er: Block::full(n, r, c),
                    em: Block::full(2 * n, r, c),
                }
            }
        }
    }

    /// Leakage unknowns of `system`, if the type has any.
    ///
    /// `E12` leakage lives in the off-diagonal cells of its `el` block.
    pub fn leakage(&self, system: usize) -> Option<Leakage> {
        let offset = self.terms(system).len();
        let (rows, columns) = (self.m_rows, self.m_columns);
        match self.cal_type {
            CalType::TE10 | CalType::UE10 => Some(Leakage {
                offset,
                rows,
                columns,
                column: None,
            }),
            CalType::UE14 => Some(Leakage {
                offset,
                rows,
                columns,
                column: Some(system),
            }),
            _ => None,
        }
    }

    /// Number of unknowns in `system`, including leakage.
    pub fn unknowns(&self, system: usize) -> usize {
        self.terms(system).len() + self.leakage(system).map_or(0, |l| l.len())
    }

    /// Number of unknowns summed over all systems.
    pub fn total_unknowns(&self) -> usize {
        (0..self.systems()).map(|k| self.unknowns(k)).sum()
    }

    /// Number of leakage unknowns summed over all systems.
    pub fn leakage_terms(&self) -> usize {
        (0..self.systems())
            .filter_map(|k| self.leakage(k))
            .map(|l| l.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(t: CalType, r: usize, c: usize) -> Layout {
        Layout::new(t, r, c).unwrap()
    }

    #[test]
    fn two_port_unknown_counts() {
        assert_eq!(layout(CalType::T8, 2, 2).total_unknowns(), 7);
        assert_eq!(layout(CalType::U8, 2, 2).total_unknowns(), 7);
        assert_eq!(layout(CalType::TE10, 2, 2).total_unknowns(), 9);
        assert_eq!(layout(CalType::UE10, 2, 2).total_unknowns(), 9);
        assert_eq!(layout(CalType::T16, 2, 2).total_unknowns(), 15);
        assert_eq!(layout(CalType::U16, 2, 2).total_unknowns(), 15);
        let ue14 = layout(CalType::UE14, 2, 2);
        assert_eq!(ue14.systems(), 2);
        assert_eq!(ue14.unknowns(0), 6);
        assert_eq!(ue14.unknowns(1), 6);
        assert_eq!(ue14.total_unknowns(), 12);
        assert_eq!(layout(CalType::E12, 2, 2).total_unknowns(), 12);
    }

    #[test]
    fn leakage_counts() {
        assert_eq!(layout(CalType::T8, 3, 3).leakage_terms(), 0);
        assert_eq!(layout(CalType::TE10, 3, 3).leakage_terms(), 6);
        assert_eq!(layout(CalType::TE10, 2, 3).leakage_terms(), 4);
        assert_eq!(layout(CalType::UE14, 3, 2).leakage_terms(), 4);
        assert_eq!(layout(CalType::UE14, 3, 1).leakage_terms(), 2);
    }

    #[test]
    fn s_ports_is_larger_dimension() {
        assert_eq!(layout(CalType::T8, 1, 3).s_ports(), 3);
        assert_eq!(layout(CalType::U8, 4, 2).s_ports(), 4);
    }

    #[test]
    fn equation_shape_follows_form() {
        assert_eq!(layout(CalType::T8, 1, 2).equation_shape(), (1, 2));
        assert_eq!(layout(CalType::U8, 2, 1).equation_shape(), (2, 1));
        assert_eq!(layout(CalType::UE14, 3, 1).equation_shape(), (3, 1));
    }

    #[test]
    fn zero_ports_rejected() {
        assert!(matches!(
            Layout::new(CalType::T8, 0, 2),
            Err(Error::InvalidDimensions(_))
        ));
    }

    #[test]
    fn model_must_be_square() {
        for (t, r, c) in [
            (CalType::T8, 3, 2),
            (CalType::TE10, 2, 1),
            (CalType::T16, 2, 1),
            (CalType::U8, 2, 3),
            (CalType::UE10, 1, 2),
            (CalType::U16, 1, 2),
            (CalType::UE14, 2, 3),
            (CalType::E12, 1, 2),
        ] {
            assert!(
                matches!(Layout::new(t, r, c), Err(Error::InvalidDimensions(_))),
                "{} {}x{} accepted",
                t,
                r,
                c
            );
        }
        assert!(Layout::new(CalType::T8, 2, 3).is_ok());
        assert!(Layout::new(CalType::U8, 3, 2).is_ok());
        assert!(Layout::new(CalType::UE14, 2, 1).is_ok());
    }

    #[test]
    fn normalized_block_numbering() {
        let Terms::T { tm, .. } = layout(CalType::T8, 2, 2).terms(0) else {
            panic!("T8 must have T-form terms");
        };
        assert_eq!(tm.coefficient(0, 0), Coefficient::One);
        assert_eq!(tm.coefficient(1, 1), Coefficient::Unknown(6));
        assert_eq!(tm.coefficient(0, 1), Coefficient::Zero);
        assert_eq!(tm.coefficient(2, 2), Coefficient::Zero);

        let Terms::U { um, ui, .. } = layout(CalType::U16, 2, 2).terms(0) else {
            panic!("U16 must have U-form terms");
        };
        assert_eq!(um.coefficient(0, 0), Coefficient::One);
        assert_eq!(um.coefficient(0, 1), Coefficient::Unknown(0));
        assert_eq!(um.coefficient(1, 1), Coefficient::Unknown(2));
        assert_eq!(ui.coefficient(0, 0), Coefficient::Unknown(3));
    }

    #[test]
    fn coefficients_cover_index_space_once() {
        for t in CalType::ALL {
            for (r, c) in [(1, 1), (1, 3), (3, 1), (2, 2), (2, 3), (3, 2), (3, 3)] {
                let Ok(l) = Layout::new(t, r, c) else {
                    continue;
                };
                for k in 0..l.systems() {
                    let mut seen = vec![0usize; l.unknowns(k)];
                    for block in l.terms(k).blocks() {
                        for i in 0..block.rows() {
                            for j in 0..block.columns() {
                                if let Coefficient::Unknown(x) = block.coefficient(i, j) {
                                    seen[x] += 1;
                                }
                            }
                        }
                    }
                    if let Some(leak) = l.leakage(k) {
                        for i in 0..r {
                            for j in 0..c {
                                if let Some(x) = leak.index(i, j) {
                                    seen[x] += 1;
                                }
                            }
                        }
                    }
                    assert!(
                        seen.iter().all(|&n| n == 1),
                        "{} {}x{} system {}: {:?}",
                        t,
                        r,
                        c,
                        k,
                        seen
                    );
                }
            }
        }
    }

    #[test]
    fn ue14_column_blocks() {
        let l = layout(CalType::UE14, 2, 2);
        let Terms::U { ui, us, .. } = l.terms(1) else {
            panic!("UE14 must have U-form terms");
        };
        assert_eq!(ui.coefficient(0, 0), Coefficient::Zero);
        assert_eq!(ui.coefficient(1, 1), Coefficient::Unknown(1));
        assert_eq!(us.coefficient(1, 1), Coefficient::Unknown(4));
        let leak = l.leakage(1).unwrap();
        assert_eq!(leak.index(0, 1), Some(5));
        assert_eq!(leak.index(1, 0), None);
    }

    #[test]
    fn e12_builds_as_ue14() {
        let l = layout(CalType::E12, 3, 2);
        assert_eq!(l.systems(), 1);
        assert!(l.leakage(0).is_none());
        let eq = l.equations();
        assert_eq!(eq.cal_type(), CalType::UE14);
        assert_eq!(eq.systems(), 2);
    }
}
