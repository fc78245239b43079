use crate::template::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("hyprforge must run as root (effective UID 0)")]
    NotRoot,

    #[error("No network: could not reach {host}")]
    NoNetwork { host: String },

    #[error("Aborted by operator at: {prompt}")]
    Aborted { prompt: String },

    #[error("Disk {disk} is too small: {size} bytes, at least {required} bytes required")]
    DiskTooSmall { disk: String, size: u64, required: u64 },

    #[error("Stage failed: {0}")]
    StageFailed(String),

    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl InstallError {
    /// True when the operator declined a confirmation somewhere in `err`'s chain.
    pub fn is_abort(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<InstallError>(),
                Some(InstallError::Aborted { .. })
            )
        })
    }
}
