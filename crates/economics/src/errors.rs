use thiserror::Error;

/// Errors raised while validating issuance parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EconomicsError {
    #[error("invalid schedule parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("bonus period of {bonus} blocks exceeds the halving interval of {interval} blocks")]
    BonusExceedsHalving { bonus: u64, interval: u64 },

    #[error("arithmetic overflow while projecting issuance: {0}")]
    CalculationOverflow(&'static str),
}
