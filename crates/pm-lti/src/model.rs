//! Either representation of an LTI system behind one type.

use crate::analysis::PoleSet;
use crate::error::LtiResult;
use crate::state_space::StateSpaceModel;
use crate::transfer_function::TransferFunctionModel;

/// An LTI system in whichever form it was built or composed in.
#[derive(Clone, Debug, PartialEq)]
pub enum LtiModel {
    StateSpace(StateSpaceModel),
    TransferFunction(TransferFunctionModel),
}

impl LtiModel {
    pub fn inputs(&self) -> usize {
        match self {
            LtiModel::StateSpace(ss) => ss.inputs(),
            LtiModel::TransferFunction(tf) => tf.inputs(),
        }
    }

    pub fn outputs(&self) -> usize {
        match self {
            LtiModel::StateSpace(ss) => ss.outputs(),
            LtiModel::TransferFunction(tf) => tf.outputs(),
        }
    }

    pub fn is_siso(&self) -> bool {
        self.inputs() == 1 && self.outputs() == 1
    }

    pub fn poles(&self) -> LtiResult<PoleSet> {
        match self {
            LtiModel::StateSpace(ss) => ss.poles(),
            LtiModel::TransferFunction(tf) => tf.poles(),
        }
    }

    pub fn dc_gain(&self) -> LtiResult<f64> {
        match self {
            LtiModel::StateSpace(ss) => ss.dc_gain(),
            LtiModel::TransferFunction(tf) => tf.dc_gain(),
        }
    }

    /// State-space form; a transfer function is realized canonically.
    pub fn to_state_space(&self) -> LtiResult<StateSpaceModel> {
        match self {
            LtiModel::StateSpace(ss) => Ok(ss.clone()),
            LtiModel::TransferFunction(tf) => tf.to_state_space(),
        }
    }

    pub fn to_transfer_function(&self) -> LtiResult<TransferFunctionModel> {
        match self {
            LtiModel::StateSpace(ss) => ss.to_transfer_function(),
            LtiModel::TransferFunction(tf) => Ok(tf.clone()),
        }
    }
}

impl From<StateSpaceModel> for LtiModel {
    fn from(ss: StateSpaceModel) -> Self {
        LtiModel::StateSpace(ss)
    }
}

impl From<TransferFunctionModel> for LtiModel {
    fn from(tf: TransferFunctionModel) -> Self {
        LtiModel::TransferFunction(tf)
    }
}
