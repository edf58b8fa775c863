// This file is part of sedge, a POSIX-compatible shell.
// Copyright (C) 2024 the sedge authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Interface to the underlying operating system
//!
//! [`RealSystem`] gathers the system calls the shell needs: process
//! creation and supervision, raw file descriptor plumbing for
//! redirections and pipes, process group management for job control, and
//! a few queries. Errors are reported as [`Errno`] values.
//!
//! File descriptors are handled as raw integers here. The shell
//! manipulates inherited descriptors 0–9 across `fork` and `exec`
//! boundaries where ownership types would get in the way; descriptors the
//! shell opens for itself are opened close-on-exec.

use crate::semantics::ExitStatus;
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, AccessFlags, ForkResult, Pid, User};
use std::convert::Infallible;
use std::ffi::{CStr, CString};
use std::os::unix::io::{BorrowedFd, IntoRawFd, RawFd};
use std::path::PathBuf;

/// Lowest file descriptor the shell uses for its internal purposes
///
/// POSIX requires descriptors 0 through 9 to be available to the user, so
/// saved and internal descriptors are moved to 10 or above.
pub const MIN_INTERNAL_FD: RawFd = 10;

/// System interface implemented with real system calls
#[derive(Clone, Copy, Debug, Default)]
pub struct RealSystem(());

impl RealSystem {
    /// Creates a new system interface.
    #[must_use]
    pub fn new() -> Self {
        RealSystem(())
    }

    /// Creates a child process.
    ///
    /// The shell is single-threaded, which is what makes forking sound
    /// here; only async-signal-safe operations may precede `exec` in a
    /// multi-threaded process.
    pub fn fork(&self) -> nix::Result<ForkResult> {
        unsafe { unistd::fork() }
    }

    /// Waits for any child process to change state.
    ///
    /// Blocks until a child exits, is killed, stops, or continues.
    pub fn wait_any(&self) -> nix::Result<WaitStatus> {
        waitpid(
            Pid::from_raw(-1),
            Some(WaitPidFlag::WUNTRACED | WaitPidFlag::WCONTINUED),
        )
    }

    /// Replaces the current process image.
    pub fn execve(
        &self,
        path: &CStr,
        args: &[CString],
        env: &[CString],
    ) -> nix::Result<Infallible> {
        unistd::execve(path, args, env)
    }

    /// Terminates the current process with the given exit status.
    pub fn exit_process(&self, exit_status: ExitStatus) -> ! {
        std::process::exit(exit_status.0)
    }

    /// Opens a pipe. Both descriptors are close-on-exec.
    pub fn pipe(&self) -> nix::Result<(RawFd, RawFd)> {
        let (reader, writer) = unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)?;
        Ok((reader.into_raw_fd(), writer.into_raw_fd()))
    }

    /// Opens a file, returning the new file descriptor.
    pub fn open(
        &self,
        path: &CStr,
        flags: nix::fcntl::OFlag,
        mode: nix::sys::stat::Mode,
    ) -> nix::Result<RawFd> {
        Errno::result(unsafe { libc::open(path.as_ptr(), flags.bits(), mode.bits() as libc::c_uint) })
    }

    /// Copies a file descriptor onto another, closing `to` first if open.
    ///
    /// The result does not have the close-on-exec flag, which is what
    /// redirections want.
    pub fn dup2(&self, from: RawFd, to: RawFd) -> nix::Result<RawFd> {
        Errno::result(unsafe { libc::dup2(from, to) })
    }

    /// Duplicates a file descriptor to 10 or above, close-on-exec.
    ///
    /// Used to save a user-visible descriptor before a redirection
    /// overwrites it.
    pub fn dup_internal(&self, fd: RawFd) -> nix::Result<RawFd> {
        Errno::result(unsafe { libc::fcntl(fd, libc::F_DUPFD_CLOEXEC, MIN_INTERNAL_FD) })
    }

    /// Closes a file descriptor.
    pub fn close(&self, fd: RawFd) -> nix::Result<()> {
        Errno::result(unsafe { libc::close(fd) }).map(drop)
    }

    /// Reads from a file descriptor.
    pub fn read(&self, fd: RawFd, buffer: &mut [u8]) -> nix::Result<usize> {
        let count =
            Errno::result(unsafe { libc::read(fd, buffer.as_mut_ptr().cast(), buffer.len()) })?;
        Ok(count as usize)
    }

    /// Writes the whole buffer to a file descriptor, retrying on `EINTR`
    /// and short writes.
    pub fn write_all(&self, fd: RawFd, mut buffer: &[u8]) -> nix::Result<()> {
        while !buffer.is_empty() {
            let result =
                Errno::result(unsafe { libc::write(fd, buffer.as_ptr().cast(), buffer.len()) });
            match result {
                Ok(count) => buffer = &buffer[count as usize..],
                Err(Errno::EINTR) => {}
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }

    /// Puts a process in a process group.
    pub fn setpgid(&self, pid: Pid, pgid: Pid) -> nix::Result<()> {
        unistd::setpgid(pid, pgid)
    }

    /// Returns the process group ID of the current process.
    #[must_use]
    pub fn getpgrp(&self) -> Pid {
        unistd::getpgrp()
    }

    /// Returns the process ID of the current process.
    #[must_use]
    pub fn getpid(&self) -> Pid {
        unistd::getpid()
    }

    /// Makes a process group the foreground job of the terminal.
    pub fn tcsetpgrp(&self, fd: RawFd, pgid: Pid) -> nix::Result<()> {
        unistd::tcsetpgrp(unsafe { BorrowedFd::borrow_raw(fd) }, pgid)
    }

    /// Tests whether the file descriptor refers to a terminal.
    #[must_use]
    pub fn isatty(&self, fd: RawFd) -> bool {
        unsafe { libc::isatty(fd) == 1 }
    }

    /// Sets a signal to be ignored.
    pub fn ignore_signal(&self, signal: Signal) -> nix::Result<()> {
        unsafe { signal::signal(signal, SigHandler::SigIgn) }.map(drop)
    }

    /// Restores a signal's default disposition.
    pub fn default_signal(&self, signal: Signal) -> nix::Result<()> {
        unsafe { signal::signal(signal, SigHandler::SigDfl) }.map(drop)
    }

    /// Returns a user's home directory.
    #[must_use]
    pub fn getpwnam_dir(&self, name: &str) -> Option<PathBuf> {
        User::from_name(name).ok().flatten().map(|user| user.dir)
    }

    /// Tests whether the path names an executable regular file.
    #[must_use]
    pub fn is_executable_file(&self, path: &CStr) -> bool {
        let is_regular = nix::sys::stat::stat(path)
            .map(|st| st.st_mode & libc::S_IFMT == libc::S_IFREG)
            .unwrap_or(false);
        is_regular && unistd::access(path, AccessFlags::X_OK).is_ok()
    }

    /// Tests whether the path names an existing file.
    #[must_use]
    pub fn file_exists(&self, path: &CStr) -> bool {
        unistd::access(path, AccessFlags::F_OK).is_ok()
    }

    /// Lists the entry names of a directory.
    ///
    /// The names come in directory order, without `.` and `..`, which is
    /// what pathname expansion wants. Names that are not valid Unicode
    /// are omitted.
    pub fn read_dir(&self, path: &str) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            if let Ok(name) = entry?.file_name().into_string() {
                names.push(name);
            }
        }
        Ok(names)
    }

    /// Tests whether the path names a directory.
    #[must_use]
    pub fn is_directory(&self, path: &str) -> bool {
        std::fs::metadata(path).is_ok_and(|metadata| metadata.is_dir())
    }

    /// Tests whether the path names an existing directory entry.
    ///
    /// A trailing symbolic link is not followed, so a dangling link
    /// counts as existing; pathname expansion matches such links.
    #[must_use]
    pub fn path_exists(&self, path: &str) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }
}

/// Reports a wait status, for re-exporting to the executor.
pub use nix::sys::wait::WaitStatus as SystemWaitStatus;

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn pipe_round_trip() {
        let system = RealSystem::new();
        let (reader, writer) = system.pipe().unwrap();
        system.write_all(writer, b"hello").unwrap();
        system.close(writer).unwrap();

        let mut buffer = [0; 16];
        let count = system.read(reader, &mut buffer).unwrap();
        assert_eq!(&buffer[..count], b"hello");
        let count = system.read(reader, &mut buffer).unwrap();
        assert_eq!(count, 0);
        system.close(reader).unwrap();
    }

    #[test]
    fn executable_detection() {
        let system = RealSystem::new();
        let sh = CString::new("/bin/sh").unwrap();
        assert!(system.is_executable_file(&sh));

        let missing = CString::new("/no/such/file").unwrap();
        assert!(!system.is_executable_file(&missing));

        // A directory is not an executable file.
        let root = CString::new("/").unwrap();
        assert!(!system.is_executable_file(&root));
    }

    #[test]
    fn directory_queries() {
        let system = RealSystem::new();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entry"), "").unwrap();
        let path = dir.path().to_str().unwrap();

        let names = system.read_dir(path).unwrap();
        assert_eq!(names, ["entry"]);
        assert!(system.read_dir("/no/such/directory").is_err());

        assert!(system.is_directory(path));
        assert!(!system.is_directory(&format!("{path}/entry")));

        assert!(system.path_exists(&format!("{path}/entry")));
        assert!(!system.path_exists(&format!("{path}/missing")));
    }
}
