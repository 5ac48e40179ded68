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

/// Trait making a [`crate::Result`] error variant loggable.
pub trait Loggable<T> {
    /// Logs the rendered error at the error level if it occured.
    ///
    /// The log target is the location of the caller.
    fn log_err(self) -> Self;
}

impl<T> Loggable<T> for crate::Result<T> {
    #[track_caller]
    fn log_err(self) -> Self {
        let location = std::panic::Location::caller();

        self.map_err(|error| {
            log::error!(target: &location.to_string(), "{:?}", error);
            error
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Loggable as _;
    use crate::FrameFunc;

    #[test]
    fn test_log_err() {
        assert!(Ok::<_, crate::ErrorWrapper>(1).log_err().is_ok());

        let error = Err::<(), _>(crate::wrap("error", FrameFunc::new("f"), None, "msg"))
            .log_err()
            .unwrap_err();

        assert_eq!(error.message(), "error");
        assert_eq!(error.call_stack().len(), 1);
    }
}
