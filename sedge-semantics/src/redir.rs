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

//! Redirection semantics
//!
//! Redirections apply in source order. For each one, the operand word is
//! expanded to a single field, the operator selects an
//! `open`/`dup2`/`close` sequence, and the result lands on the target
//! file descriptor (0 for input operators, 1 for output operators, unless
//! an `io_number` says otherwise).
//!
//! When a redirection applies to a command running in the current shell
//! (a built-in or a function), the original descriptors must come back
//! afterwards. [`RedirGuard`] saves each affected descriptor by
//! duplicating it to 10 or above before overwriting it, and restores the
//! saved descriptors when dropped. In a forked child about to `exec`,
//! saving is pointless; a guard created with `undo = false` applies
//! redirections permanently.
//!
//! A here-document is delivered over a pipe: the body is written to the
//! pipe up front and the read end becomes the target descriptor. A body
//! larger than the pipe capacity is not supported.

use crate::expansion;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use sedge_env::option::Option::Clobber;
use sedge_env::Env;
use sedge_syntax::source::Location;
use sedge_syntax::syntax::{IoRedirect, RedirOp};
use std::ffi::CString;
use std::ops::{Deref, DerefMut};
use std::os::unix::io::RawFd;
use thiserror::Error;

/// Types of errors that may occur in a redirection
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ErrorCause {
    /// Expansion of the operand word failed.
    #[error(transparent)]
    Expansion(expansion::ErrorCause),
    /// A file could not be opened.
    #[error("cannot open `{path}`: {errno}")]
    OpenFile {
        /// Pathname that was to be opened
        path: String,
        /// Error from the system
        errno: Errno,
    },
    /// The `noclobber` option kept an existing file from being
    /// overwritten.
    #[error("`{path}` exists and `noclobber` is set")]
    FileExists {
        /// Pathname of the existing file
        path: String,
    },
    /// The operand of `<&` or `>&` is not a number or `-`.
    #[error("`{operand}` is not a valid file descriptor")]
    InvalidFdOperand {
        /// The operand as expanded
        operand: String,
    },
    /// The target file descriptor could not be modified.
    #[error("cannot redirect file descriptor {fd}: {errno}")]
    FdNotOverwritten {
        /// Target descriptor
        fd: RawFd,
        /// Error from the system
        errno: Errno,
    },
    /// A pathname contains a nul byte.
    #[error("pathname contains a nul byte")]
    NulByte,
}

/// Explanation of a redirection failure
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{cause}")]
pub struct Error {
    /// Cause of the error
    pub cause: ErrorCause,
    /// Position of the redirection in the source code
    pub location: Location,
}

impl From<expansion::Error> for Error {
    fn from(error: expansion::Error) -> Self {
        Error {
            cause: ErrorCause::Expansion(error.cause),
            location: error.location,
        }
    }
}

/// Record of a saved file descriptor
#[derive(Clone, Copy, Debug)]
struct SavedFd {
    /// Descriptor the redirection overwrote
    original: RawFd,
    /// Internal descriptor remembering the original open file, or `None`
    /// if `original` was closed before the redirection
    save: Option<RawFd>,
}

/// Environment wrapper that performs and undoes redirections
#[derive(Debug)]
#[must_use = "redirections are undone when the guard is dropped"]
pub struct RedirGuard<'e> {
    env: &'e mut Env,
    saved: Vec<SavedFd>,
    undo: bool,
}

impl Deref for RedirGuard<'_> {
    type Target = Env;
    fn deref(&self) -> &Env {
        self.env
    }
}

impl DerefMut for RedirGuard<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}

impl<'e> RedirGuard<'e> {
    /// Creates a redirection guard.
    ///
    /// With `undo` true, affected descriptors are saved and restored when
    /// the guard is dropped. With `undo` false, redirections are
    /// permanent.
    pub fn new(env: &'e mut Env, undo: bool) -> Self {
        RedirGuard {
            env,
            saved: Vec::new(),
            undo,
        }
    }

    /// Performs all the given redirections, in order.
    pub fn perform_redirs(&mut self, redirs: &[IoRedirect]) -> Result<(), Error> {
        for redir in redirs {
            self.perform_redir(redir)?;
        }
        Ok(())
    }

    /// Performs one redirection.
    pub fn perform_redir(&mut self, redir: &IoRedirect) -> Result<(), Error> {
        let target = redir.fd_or_default().0;
        let location = *redir.name.location();

        let source = match redir.op {
            RedirOp::FileIn => Some(self.open_file(redir, OFlag::O_RDONLY)?),
            RedirOp::FileInOut => Some(self.open_file(redir, OFlag::O_RDWR | OFlag::O_CREAT)?),
            RedirOp::FileOut => Some(self.open_for_output(redir)?),
            RedirOp::FileClobber => {
                Some(self.open_file(redir, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC)?)
            }
            RedirOp::FileAppend => {
                Some(self.open_file(redir, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND)?)
            }
            RedirOp::FdIn | RedirOp::FdOut => {
                let operand = expansion::expand_word(self.env, &redir.name)?;
                if operand.value == "-" {
                    self.save_fd(target, location)?;
                    let _ = self.env.system.close(target);
                    return Ok(());
                }
                match operand.value.parse::<RawFd>() {
                    Ok(fd) => {
                        self.save_fd(target, location)?;
                        self.env.system.dup2(fd, target).map_err(|errno| Error {
                            cause: ErrorCause::FdNotOverwritten { fd: target, errno },
                            location,
                        })?;
                        return Ok(());
                    }
                    Err(_) => {
                        return Err(Error {
                            cause: ErrorCause::InvalidFdOperand {
                                operand: operand.value,
                            },
                            location,
                        });
                    }
                }
            }
            RedirOp::HereDoc | RedirOp::HereDocRemoveTabs => Some(self.here_doc_pipe(redir)?),
        };

        let Some(source) = source else { return Ok(()) };
        self.save_fd(target, location)?;
        let result = self.env.system.dup2(source, target);
        let _ = self.env.system.close(source);
        result.map_err(|errno| Error {
            cause: ErrorCause::FdNotOverwritten { fd: target, errno },
            location,
        })?;
        Ok(())
    }

    /// Expands the operand and opens the named file.
    fn open_file(&mut self, redir: &IoRedirect, flags: OFlag) -> Result<RawFd, Error> {
        let location = *redir.name.location();
        let operand = expansion::expand_word(self.env, &redir.name)?;
        let path = CString::new(operand.value.clone()).map_err(|_| Error {
            cause: ErrorCause::NulByte,
            location,
        })?;
        self.env
            .system
            .open(&path, flags, Mode::from_bits_truncate(0o666))
            .map_err(|errno| Error {
                cause: ErrorCause::OpenFile {
                    path: operand.value,
                    errno,
                },
                location,
            })
    }

    /// Opens a file for the `>` operator, honoring `noclobber`.
    fn open_for_output(&mut self, redir: &IoRedirect) -> Result<RawFd, Error> {
        if self.env.options.is_on(Clobber) {
            return self.open_file(redir, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC);
        }

        let location = *redir.name.location();
        let operand = expansion::expand_word(self.env, &redir.name)?;
        let path = CString::new(operand.value.clone()).map_err(|_| Error {
            cause: ErrorCause::NulByte,
            location,
        })?;
        let mode = Mode::from_bits_truncate(0o666);
        match self
            .env
            .system
            .open(&path, OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_EXCL, mode)
        {
            Ok(fd) => Ok(fd),
            Err(Errno::EEXIST) => {
                // An existing non-regular file, such as /dev/null, may
                // still be written to.
                let is_regular = nix::sys::stat::stat(path.as_c_str())
                    .map(|st| st.st_mode & libc::S_IFMT == libc::S_IFREG)
                    .unwrap_or(true);
                if is_regular {
                    Err(Error {
                        cause: ErrorCause::FileExists {
                            path: operand.value,
                        },
                        location,
                    })
                } else {
                    self.env
                        .system
                        .open(&path, OFlag::O_WRONLY, mode)
                        .map_err(|errno| Error {
                            cause: ErrorCause::OpenFile {
                                path: operand.value,
                                errno,
                            },
                            location,
                        })
                }
            }
            Err(errno) => Err(Error {
                cause: ErrorCause::OpenFile {
                    path: operand.value,
                    errno,
                },
                location,
            }),
        }
    }

    /// Builds the readable end of a here-document.
    ///
    /// The body lines are expanded (unless the delimiter was quoted, in
    /// which case they are literal already) and written to a pipe whose
    /// read end is returned.
    fn here_doc_pipe(&mut self, redir: &IoRedirect) -> Result<RawFd, Error> {
        let location = *redir.name.location();
        let mut content = String::new();
        for line in redir.here_document_lines() {
            let field = expansion::expand_word(self.env, line)?;
            content.push_str(&field.value);
            content.push('\n');
        }

        let io_error = |errno| Error {
            cause: ErrorCause::FdNotOverwritten {
                fd: redir.fd_or_default().0,
                errno,
            },
            location,
        };
        let (reader, writer) = self.env.system.pipe().map_err(io_error)?;
        self.env
            .system
            .write_all(writer, content.as_bytes())
            .map_err(io_error)?;
        let _ = self.env.system.close(writer);
        Ok(reader)
    }

    /// Remembers the open file at the target descriptor so it can be
    /// restored.
    fn save_fd(&mut self, fd: RawFd, location: Location) -> Result<(), Error> {
        if !self.undo {
            return Ok(());
        }
        match self.env.system.dup_internal(fd) {
            Ok(save) => {
                self.saved.push(SavedFd {
                    original: fd,
                    save: Some(save),
                });
                Ok(())
            }
            // The descriptor was closed; restoring means closing again.
            Err(Errno::EBADF) => {
                self.saved.push(SavedFd {
                    original: fd,
                    save: None,
                });
                Ok(())
            }
            Err(errno) => Err(Error {
                cause: ErrorCause::FdNotOverwritten { fd, errno },
                location,
            }),
        }
    }
}

impl Drop for RedirGuard<'_> {
    fn drop(&mut self) {
        for saved in self.saved.drain(..).rev() {
            match saved.save {
                Some(save) => {
                    let _ = self.env.system.dup2(save, saved.original);
                    let _ = self.env.system.close(save);
                }
                None => {
                    let _ = self.env.system.close(saved.original);
                }
            }
        }
    }
}
