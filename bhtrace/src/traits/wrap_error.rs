// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::panic::Location;

use crate::{CauseFunc, FrameFunc};

/// Trait for wrapping the errors of a [`std::result::Result`] into [`crate::ErrorWrapper`].
///
/// The error can be either a failure which has not been wrapped yet, i.e. any
/// [`std::error::Error`] (or a string describing the failure), or an already wrapped
/// [`crate::ErrorWrapper`].  Either way, a new frame is appended to the call stack.
pub trait WrapError<T> {
    /// Maps a `Result<T, E>` to `Result<T, ErrorWrapper>`.
    ///
    /// The [Ok] variant is left untouched.
    ///
    /// The [Err] variant is wrapped with a frame describing `func`, the location of the caller
    /// and the `message`.  See [`crate::wrap`] for how the `cause` is recorded.
    fn wrap_err<M>(
        self,
        func: FrameFunc,
        cause: Option<CauseFunc>,
        message: M,
    ) -> crate::Result<T>
    where
        M: Into<String>;
}

impl<T, E> WrapError<T> for std::result::Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    #[track_caller]
    fn wrap_err<M>(
        self,
        func: FrameFunc,
        cause: Option<CauseFunc>,
        message: M,
    ) -> crate::Result<T>
    where
        M: Into<String>,
    {
        let location = Location::caller();

        self.map_err(|failure| crate::wrap_at(failure, func, cause, message, location))
    }
}
