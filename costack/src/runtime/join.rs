use super::coroutine::{CoroutineId, Status};
use super::scheduler::{self, Shared};
use crate::error::{Error, Result};

/// Drives the scheduler from main until `id` is `Dead`, then reclaims it.
///
/// The caller must be the main context of this runtime.
///
/// Each round resumes a randomly selected coroutine, not necessarily the
/// target, and returns to main only when some coroutine terminates. Many
/// unrelated coroutines may therefore finish before the target does.
pub(crate) fn wait(shared: &Shared, id: CoroutineId, generation: u32) -> Result<()> {
    loop {
        let status = shared
            .borrow()
            .registry
            .status(id, generation)
            .ok_or(Error::StaleHandle)?;

        if status == Status::Dead {
            break;
        }

        resume(shared)?;
    }

    let coroutine = shared
        .borrow_mut()
        .registry
        .reclaim(id, generation)
        .ok_or(Error::StaleHandle)?;

    if coroutine.panicked {
        return Err(Error::Panicked {
            id,
            name: coroutine.name.clone(),
        });
    }

    Ok(())
}

/// Transfers control from main into a selected coroutine.
///
/// Returns once a coroutine terminates and control flows back to main.
fn resume(shared: &Shared) -> Result<()> {
    let transfer = scheduler::prepare_resume(shared)?;

    // Safety: the borrow taken by `prepare_resume` is released; main's
    // descriptor and the target stay in their slots because only main
    // reclaims, and main is suspended inside this call.
    let switched = unsafe { transfer.perform() };

    shared.borrow_mut().registry.activate(CoroutineId::MAIN);

    switched
}
