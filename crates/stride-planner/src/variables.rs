//! Optimization variables
//!
//! The decision vector of the nonlinear program is the concatenation of
//! several variable sets, each owning a contiguous block of columns:
//!
//! ```text
//! x = [ base | ee_motion | ... ]
//!      ^0     ^offset(ee_motion)
//! ```
//!
//! Sets are registered under a [`VariableId`] and accessed by id. The
//! concrete kind of a set is recovered by matching on [`VariableSet`].

use std::fmt;

use nalgebra::DVector;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use thiserror::Error;
use tracing::{debug, warn};

use stride_core::{Coord3, EndeffectorId};

use crate::ee_motion::{EndeffectorMotion, MotionError};
use crate::endeffectors::{EndeffectorsError, EndeffectorsMotion};

/// Anything that exposes a block of optimization parameters
pub trait Parametrization {
    type Error;

    /// Length of the parameter block
    fn num_parameters(&self) -> usize;

    /// Current values of the parameter block
    fn optimization_parameters(&self) -> DVector<f64>;

    /// Overwrite the parameter block
    fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), Self::Error>;
}

impl Parametrization for EndeffectorMotion {
    type Error = MotionError;

    fn num_parameters(&self) -> usize {
        EndeffectorMotion::num_parameters(self)
    }

    fn optimization_parameters(&self) -> DVector<f64> {
        EndeffectorMotion::optimization_parameters(self)
    }

    fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), MotionError> {
        EndeffectorMotion::set_optimization_parameters(self, x)
    }
}

impl Parametrization for EndeffectorsMotion {
    type Error = EndeffectorsError;

    fn num_parameters(&self) -> usize {
        EndeffectorsMotion::num_parameters(self)
    }

    fn optimization_parameters(&self) -> DVector<f64> {
        EndeffectorsMotion::optimization_parameters(self)
    }

    fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), EndeffectorsError> {
        EndeffectorsMotion::set_optimization_parameters(self, x)
    }
}

/// Stable name of a variable set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId(pub &'static str);

impl VariableId {
    pub const ENDEFFECTORS_MOTION: VariableId = VariableId("ee_motion");
    pub const BASE_MOTION: VariableId = VariableId("base_motion");
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Variable container errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariableError {
    #[error("Variable set '{0}' is already registered")]
    DuplicateId(VariableId),
    #[error("No variable set named '{0}'")]
    UnknownId(VariableId),
    #[error("Variable set '{id}' is not a {expected} set")]
    WrongKind { id: VariableId, expected: &'static str },
    #[error("Invalid parameter dimension: expected {expected}, got {got}")]
    InvalidParameterDimension { expected: usize, got: usize },
    #[error("Endeffector motion error: {0}")]
    Endeffectors(#[from] EndeffectorsError),
}

/// Plain block of values without further structure
///
/// Stands in for variable sets whose parametrization lives elsewhere,
/// such as the base motion.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorVariables {
    values: DVector<f64>,
}

impl VectorVariables {
    pub fn new(values: DVector<f64>) -> Self {
        Self { values }
    }

    pub fn zeros(len: usize) -> Self {
        Self::new(DVector::zeros(len))
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }
}

impl Parametrization for VectorVariables {
    type Error = VariableError;

    fn num_parameters(&self) -> usize {
        self.values.len()
    }

    fn optimization_parameters(&self) -> DVector<f64> {
        self.values.clone()
    }

    fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), VariableError> {
        if x.len() != self.values.len() {
            return Err(VariableError::InvalidParameterDimension {
                expected: self.values.len(),
                got: x.len(),
            });
        }
        self.values.copy_from_slice(x);
        Ok(())
    }
}

/// One registered variable set
#[derive(Debug, Clone)]
pub enum VariableSet {
    EndeffectorsMotion(EndeffectorsMotion),
    Vector(VectorVariables),
}

impl VariableSet {
    /// Human readable kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            VariableSet::EndeffectorsMotion(_) => "endeffectors motion",
            VariableSet::Vector(_) => "vector",
        }
    }
}

impl Parametrization for VariableSet {
    type Error = VariableError;

    fn num_parameters(&self) -> usize {
        match self {
            VariableSet::EndeffectorsMotion(m) => m.num_parameters(),
            VariableSet::Vector(v) => v.num_parameters(),
        }
    }

    fn optimization_parameters(&self) -> DVector<f64> {
        match self {
            VariableSet::EndeffectorsMotion(m) => m.optimization_parameters(),
            VariableSet::Vector(v) => v.optimization_parameters(),
        }
    }

    fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), VariableError> {
        match self {
            VariableSet::EndeffectorsMotion(m) => Ok(m.set_optimization_parameters(x)?),
            VariableSet::Vector(v) => v.set_optimization_parameters(x),
        }
    }
}

impl From<EndeffectorsMotion> for VariableSet {
    fn from(motion: EndeffectorsMotion) -> Self {
        VariableSet::EndeffectorsMotion(motion)
    }
}

impl From<VectorVariables> for VariableSet {
    fn from(values: VectorVariables) -> Self {
        VariableSet::Vector(values)
    }
}

/// Ordered registry of variable sets forming the decision vector
#[derive(Debug, Clone, Default)]
pub struct VariableContainer {
    sets: Vec<(VariableId, VariableSet)>,
}

impl VariableContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a set; its block follows every set added before
    pub fn add(&mut self, id: VariableId, set: impl Into<VariableSet>) -> Result<(), VariableError> {
        if self.position(id).is_some() {
            return Err(VariableError::DuplicateId(id));
        }
        let set = set.into();
        debug!(%id, kind = set.kind(), parameters = set.num_parameters(), "registered variable set");
        self.sets.push((id, set));
        Ok(())
    }

    /// Remove every set
    pub fn clear(&mut self) {
        self.sets.clear();
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Registered ids in decision vector order
    pub fn ids(&self) -> impl Iterator<Item = VariableId> + '_ {
        self.sets.iter().map(|(id, _)| *id)
    }

    pub fn get(&self, id: VariableId) -> Result<&VariableSet, VariableError> {
        self.position(id)
            .map(|i| &self.sets[i].1)
            .ok_or(VariableError::UnknownId(id))
    }

    pub fn get_mut(&mut self, id: VariableId) -> Result<&mut VariableSet, VariableError> {
        let i = self.position(id).ok_or(VariableError::UnknownId(id))?;
        Ok(&mut self.sets[i].1)
    }

    /// Endeffector motion registered under `id`
    pub fn endeffectors_motion(&self, id: VariableId) -> Result<&EndeffectorsMotion, VariableError> {
        match self.get(id)? {
            VariableSet::EndeffectorsMotion(m) => Ok(m),
            _ => Err(VariableError::WrongKind { id, expected: "endeffectors motion" }),
        }
    }

    pub fn endeffectors_motion_mut(&mut self, id: VariableId) -> Result<&mut EndeffectorsMotion, VariableError> {
        match self.get_mut(id)? {
            VariableSet::EndeffectorsMotion(m) => Ok(m),
            _ => Err(VariableError::WrongKind { id, expected: "endeffectors motion" }),
        }
    }

    /// First column of a set in the decision vector
    pub fn offset(&self, id: VariableId) -> Result<usize, VariableError> {
        let i = self.position(id).ok_or(VariableError::UnknownId(id))?;
        Ok(self.sets[..i].iter().map(|(_, s)| s.num_parameters()).sum())
    }

    /// Length of the decision vector
    pub fn num_parameters(&self) -> usize {
        self.sets.iter().map(|(_, s)| s.num_parameters()).sum()
    }

    /// Concatenated values of every set
    pub fn optimization_parameters(&self) -> DVector<f64> {
        let mut x = DVector::zeros(self.num_parameters());
        let mut offset = 0;
        for (_, set) in &self.sets {
            let block = set.optimization_parameters();
            x.rows_mut(offset, block.len()).copy_from(&block);
            offset += block.len();
        }
        x
    }

    /// Split a decision vector and hand each set its block
    pub fn set_optimization_parameters(&mut self, x: &[f64]) -> Result<(), VariableError> {
        let expected = self.num_parameters();
        if x.len() != expected {
            warn!(expected, got = x.len(), "rejected decision vector");
            return Err(VariableError::InvalidParameterDimension { expected, got: x.len() });
        }

        let mut offset = 0;
        for (_, set) in &mut self.sets {
            let n = set.num_parameters();
            set.set_optimization_parameters(&x[offset..offset + n])?;
            offset += n;
        }
        Ok(())
    }

    /// Jacobian of one foot coordinate sampled at several times
    ///
    /// Row `i` is `∂p_dim(times[i])/∂x` with columns spanning the whole
    /// decision vector.
    pub fn endeffector_position_jacobian(
        &self,
        id: VariableId,
        times: &[f64],
        ee: EndeffectorId,
        dim: Coord3,
    ) -> Result<CsrMatrix<f64>, VariableError> {
        let motion = self.endeffectors_motion(id)?;
        let offset = self.offset(id)?;

        let mut coo = CooMatrix::new(times.len(), self.num_parameters());
        for (row, &t) in times.iter().enumerate() {
            for (col, value) in motion.jacobian_pos(t, ee, dim)?.iter() {
                coo.push(row, offset + col, value);
            }
        }
        Ok(CsrMatrix::from(&coo))
    }

    fn position(&self, id: VariableId) -> Option<usize> {
        self.sets.iter().position(|(set_id, _)| *set_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotionParameters;
    use approx::assert_relative_eq;

    fn container() -> VariableContainer {
        let mut vars = VariableContainer::new();
        vars.add(VariableId::BASE_MOTION, VectorVariables::new(DVector::from_vec(vec![1.0, 2.0, 3.0])))
            .unwrap();
        let motion = EndeffectorsMotion::from_parameters(&MotionParameters::default()).unwrap();
        vars.add(VariableId::ENDEFFECTORS_MOTION, motion).unwrap();
        vars
    }

    #[test]
    fn test_offsets_follow_insertion_order() {
        let vars = container();

        assert_eq!(vars.len(), 2);
        assert_eq!(vars.num_parameters(), 11);
        assert_eq!(vars.offset(VariableId::BASE_MOTION).unwrap(), 0);
        assert_eq!(vars.offset(VariableId::ENDEFFECTORS_MOTION).unwrap(), 3);
        assert_eq!(
            vars.ids().collect::<Vec<_>>(),
            vec![VariableId::BASE_MOTION, VariableId::ENDEFFECTORS_MOTION]
        );
    }

    #[test]
    fn test_duplicate_and_unknown_ids() {
        let mut vars = container();

        assert_eq!(
            vars.add(VariableId::BASE_MOTION, VectorVariables::zeros(2)),
            Err(VariableError::DuplicateId(VariableId::BASE_MOTION))
        );
        assert_eq!(
            vars.offset(VariableId("contact_forces")),
            Err(VariableError::UnknownId(VariableId("contact_forces")))
        );
        assert!(matches!(
            vars.endeffectors_motion(VariableId::BASE_MOTION),
            Err(VariableError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_parameters_split_across_sets() {
        let mut vars = container();
        let x: Vec<f64> = (0..11).map(|i| i as f64).collect();
        vars.set_optimization_parameters(&x).unwrap();

        assert_eq!(vars.optimization_parameters().as_slice(), x.as_slice());
        let ee = vars.endeffectors_motion(VariableId::ENDEFFECTORS_MOTION).unwrap();
        assert_eq!(ee.optimization_parameters().as_slice(), &x[3..]);
        match vars.get(VariableId::BASE_MOTION).unwrap() {
            VariableSet::Vector(v) => assert_eq!(v.values().as_slice(), &[0.0, 1.0, 2.0]),
            other => panic!("unexpected set kind {}", other.kind()),
        }
    }

    #[test]
    fn test_mutable_access_by_id() {
        let mut vars = container();

        let motion = vars.endeffectors_motion_mut(VariableId::ENDEFFECTORS_MOTION).unwrap();
        motion.set_optimization_parameters(&[0.5; 8]).unwrap();
        assert_eq!(vars.optimization_parameters().rows(3, 8).iter().copied().collect::<Vec<_>>(), vec![0.5; 8]);

        match vars.get_mut(VariableId::BASE_MOTION).unwrap() {
            VariableSet::Vector(v) => v.set_optimization_parameters(&[7.0, 8.0, 9.0]).unwrap(),
            other => panic!("unexpected set kind {}", other.kind()),
        }
        assert_eq!(&vars.optimization_parameters().as_slice()[..3], &[7.0, 8.0, 9.0]);

        assert!(matches!(
            vars.endeffectors_motion_mut(VariableId::BASE_MOTION),
            Err(VariableError::WrongKind { .. })
        ));
        assert!(matches!(
            vars.get_mut(VariableId("contact_forces")),
            Err(VariableError::UnknownId(_))
        ));
    }

    #[test]
    fn test_wrong_decision_vector_length() {
        let mut vars = container();
        assert_eq!(
            vars.set_optimization_parameters(&[0.0; 4]),
            Err(VariableError::InvalidParameterDimension { expected: 11, got: 4 })
        );
    }

    #[test]
    fn test_position_jacobian_in_global_columns() {
        let vars = container();

        // RF stands at 0.1 and is halfway through its swing at 0.9
        let jac = vars
            .endeffector_position_jacobian(VariableId::ENDEFFECTORS_MOTION, &[0.1, 0.9], EndeffectorId(1), Coord3::X)
            .unwrap();

        assert_eq!(jac.nrows(), 2);
        assert_eq!(jac.ncols(), 11);
        let entries: Vec<(usize, usize, f64)> = jac.triplet_iter().map(|(i, j, v)| (i, j, *v)).collect();
        assert!(entries.iter().all(|&(i, j, _)| i == 1 && (j == 5 || j == 6)));
        assert_eq!((entries[0].0, entries[0].1), (1, 5));
        assert_relative_eq!(entries[0].2, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_jacobian_requires_motion_set() {
        let vars = container();
        assert!(matches!(
            vars.endeffector_position_jacobian(VariableId::BASE_MOTION, &[0.5], EndeffectorId(0), Coord3::Z),
            Err(VariableError::WrongKind { .. })
        ));
        assert!(matches!(
            vars.endeffector_position_jacobian(VariableId::ENDEFFECTORS_MOTION, &[0.5], EndeffectorId(9), Coord3::Z),
            Err(VariableError::Endeffectors(EndeffectorsError::UnknownEndeffector(_)))
        ));
    }

    #[test]
    fn test_clear() {
        let mut vars = container();
        vars.clear();
        assert!(vars.is_empty());
        assert_eq!(vars.num_parameters(), 0);
    }

    #[test]
    fn test_vector_variables_reject_wrong_length() {
        let mut v = VectorVariables::zeros(2);
        assert!(v.set_optimization_parameters(&[1.0]).is_err());
        v.set_optimization_parameters(&[1.0, 2.0]).unwrap();
        assert_eq!(v.optimization_parameters().as_slice(), &[1.0, 2.0]);
    }
}
