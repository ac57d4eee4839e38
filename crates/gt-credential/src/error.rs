use thiserror::Error;

use gt_core::{Address, ErrorClass, OwnershipError, TokenId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// Only verification contract can mint.
    #[error("caller {caller} is not the minter ({minter})")]
    Unauthorized { caller: Address, minter: Address },

    #[error("{0} already minted")]
    AlreadyMinted(TokenId),

    #[error("{0} not found")]
    NotFound(TokenId),

    #[error("cannot mint to the zero address")]
    ZeroRecipient,

    /// Every token id from the sequential cursor up to `u64::MAX` is taken.
    #[error("token ids exhausted")]
    TokenIdExhausted,

    #[error(transparent)]
    Ownership(#[from] OwnershipError),
}

impl CredentialError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Unauthorized { .. } => ErrorClass::Authorization,
            // Double issue only happens through a replayed or racing callback.
            Self::AlreadyMinted(_) => ErrorClass::Protocol,
            Self::NotFound(_) | Self::ZeroRecipient | Self::TokenIdExhausted => {
                ErrorClass::Validation
            }
            Self::Ownership(e) => e.class(),
        }
    }
}
