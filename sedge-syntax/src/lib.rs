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

//! This crate defines the shell command language syntax and the parser for
//! it.
//!
//! The [`syntax`] module contains the types that make up the abstract
//! syntax tree. The [`parser`] module parses source code into those types.
//! The [`printer`] module renders a tree for debugging. The [`input`] and
//! [`alias`] modules define the interfaces the parser consumes input and
//! alias definitions through.

pub mod alias;
pub mod input;
pub mod parser;
pub mod printer;
pub mod source;
pub mod syntax;
