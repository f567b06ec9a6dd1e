/// Who is issuing calls against a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    /// Effective uid 0; may read hardware frequency and change policy.
    Elevated,
    Unprivileged,
}

impl Principal {
    /// Principal of the running process, from its effective uid.
    pub fn current() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        let euid = unsafe { libc::geteuid() };
        if euid == 0 {
            Principal::Elevated
        } else {
            Principal::Unprivileged
        }
    }

    pub fn is_elevated(self) -> bool {
        matches!(self, Principal::Elevated)
    }
}
