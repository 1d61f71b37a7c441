use thiserror::Error;

/// Failures raised while standing up the window, the device, or the GUI
/// context. Construction never propagates these; they are logged and the
/// affected operations degrade to no-ops.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("window class registration failed: {0}")]
    ClassRegistration(#[source] windows::core::Error),

    #[error("window creation failed: {0}")]
    WindowCreation(#[source] windows::core::Error),

    #[error("Direct3D 9 runtime unavailable")]
    Direct3DUnavailable,

    #[error("device creation failed: {0}")]
    DeviceCreation(#[source] windows::core::Error),

    #[error("renderer resource creation failed: {0}")]
    RendererResources(#[source] windows::core::Error),

    #[error("a GUI context is already alive in this process")]
    ContextExists,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_phase() {
        let err = HostError::DeviceCreation(windows::core::Error::empty());
        assert!(err.to_string().starts_with("device creation failed"));
        assert_eq!(
            HostError::ContextExists.to_string(),
            "a GUI context is already alive in this process"
        );
    }
}
