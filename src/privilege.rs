//! Root check and one-way switch to the configured unprivileged identity.

use anyhow::{bail, Result};
use std::io;

use crate::config::RunAsConfig;

/// Refuse to continue unless the effective uid is root.
pub fn ensure_root() -> Result<()> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    check_privileged(euid)
}

fn check_privileged(euid: u32) -> Result<()> {
    if euid != 0 {
        bail!("must be started as root (privileges are dropped after reading the configuration), euid={euid}");
    }
    Ok(())
}

/// Drop supplementary groups, then gid, then uid. Irreversible.
pub fn drop_privileges(run_as: RunAsConfig) -> Result<()> {
    // SAFETY: plain syscalls on integer arguments; a null list with size 0
    // clears the supplementary groups.
    unsafe {
        if libc::setgroups(0, std::ptr::null()) != 0 {
            return Err(io::Error::last_os_error().into());
        }
        if libc::setgid(run_as.gid as libc::gid_t) != 0 {
            return Err(anyhow::Error::from(io::Error::last_os_error())
                .context(format!("setgid({})", run_as.gid)));
        }
        if libc::setuid(run_as.uid as libc::uid_t) != 0 {
            return Err(anyhow::Error::from(io::Error::last_os_error())
                .context(format!("setuid({})", run_as.uid)));
        }
    }

    // SAFETY: getters have no preconditions.
    let (uid, gid, euid, egid) =
        unsafe { (libc::getuid(), libc::getgid(), libc::geteuid(), libc::getegid()) };
    verify_dropped(run_as, uid, gid, euid, egid)?;

    tracing::debug!(uid, gid, "root privileges dropped");
    Ok(())
}

fn verify_dropped(run_as: RunAsConfig, uid: u32, gid: u32, euid: u32, egid: u32) -> Result<()> {
    if uid != run_as.uid || euid != run_as.uid || gid != run_as.gid || egid != run_as.gid {
        bail!(
            "privilege drop incomplete: uid={uid} euid={euid} gid={gid} egid={egid}, wanted uid={} gid={}",
            run_as.uid,
            run_as.gid
        );
    }
    Ok(())
}
