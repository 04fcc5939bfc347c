// SPDX-License-Identifier: MIT

/// Process termination primitive used for logic bugs. Never returns.
pub trait Terminator: Send + Sync {
    fn terminate(&self, msg: &str) -> !;
}

/// Aborts the process. The message has already been emitted by the reporter.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortTerminator;

impl Terminator for AbortTerminator {
    fn terminate(&self, _msg: &str) -> ! {
        std::process::abort()
    }
}

/// Unwinds the calling thread instead of aborting. Lets tests and embedders observe it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicTerminator;

impl Terminator for PanicTerminator {
    fn terminate(&self, msg: &str) -> ! {
        panic!("logic bug: {msg}")
    }
}
