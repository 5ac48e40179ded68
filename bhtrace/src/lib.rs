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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate annotates errors with a structured call-stack trace, built up by the call sites the
//! error propagates through.
//!
//! # Details
//!
//! Every call site which receives an error from a callee describes itself with a [`FrameFunc`]
//! (usually via the [`frame_func!`] macro), and optionally names the failed callee with a
//! [`CauseFunc`].  Calling [`wrap`] (or [`WrapError::wrap_err`][traits::WrapError] on a
//! [`Result`][std::result::Result]) then appends a [`Frame`] to the [`ErrorWrapper`] call stack.
//!
//! The first wrap turns a bare failure into an [`ErrorWrapper`] and logs a warning.  Subsequent
//! wraps reuse the same [`ErrorWrapper`], so the original error message is kept and frames
//! accumulate from the innermost (index 0) to the outermost (last index) call site.
//!
//! Only one cause is kept: it lives on the innermost frame and is recorded by the first wrap
//! which supplies one.  Causes passed to later wraps are dropped.
//!
//! The [`Display`][std::fmt::Display] of an [`ErrorWrapper`] is its
//! [rendered][ErrorWrapper::render] JSON trace:
//!
//! ```json
//! {
//!   "error": "<original failure description>",
//!   "callstack": [
//!     {
//!       "wrap_message": "<optional>",
//!       "wrap_place": "<file>:<line>",
//!       "func_name": "<qualified function name>",
//!       "func_args": { "<key>": "<value>" },
//!       "func_data": { "<key>": "<value>" },
//!       "error_cause": {
//!         "func_name": "<callee name>",
//!         "func_args": { "<key>": "<value>" }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Argument and data values are any [`serde::Serialize`] type.  A value which cannot be
//! serialized is recorded as [`NON_SERIALIZABLE_VALUE`] instead.
//!
//! # Examples
//!
//! ```
//! use bhtrace::{frame_func, func_args, traits::WrapError, CauseFunc};
//!
//! fn read_config(path: &str) -> bhtrace::Result<String> {
//!     let frame = frame_func!().with_arg("path", path);
//!     std::fs::read_to_string(path).wrap_err(
//!         frame,
//!         Some(CauseFunc::new().with_name("std::fs::read_to_string").with_arg("path", path)),
//!         "cannot read configuration",
//!     )
//! }
//!
//! fn start(attempt: u32) -> bhtrace::Result<()> {
//!     let frame = frame_func!().with_args(func_args! { "attempt" => attempt });
//!     read_config("/nonexistent/app.toml").wrap_err(frame, None, "startup failed")?;
//!     Ok(())
//! }
//!
//! let error = start(1).unwrap_err();
//! let call_stack = error.call_stack();
//!
//! assert_eq!(call_stack.len(), 2);
//! assert!(call_stack[0].func().name().ends_with("read_config"));
//! assert_eq!(
//!     call_stack[0].cause().map(|cause| cause.name()),
//!     Some("std::fs::read_to_string")
//! );
//! assert!(call_stack[1].func().name().ends_with("start"));
//! assert!(call_stack[1].cause().is_none());
//!
//! // The whole trace, ready for the log.
//! println!("{error}");
//! ```

use std::panic::Location;

use serde::Serialize;

mod display;
mod frame;
pub mod traits;

pub use frame::{
    __enclosing_function, to_func_value, CauseFunc, Frame, FrameFunc, FuncArgs, FuncData,
    NON_SERIALIZABLE_VALUE,
};

/// Error carrying the description of the original failure, along with the call stack of all the
/// wraps it went through.
///
/// The call stack is append-only: index 0 is the innermost (first) wrap and the last index is
/// the outermost (most recent) one.
#[derive(Serialize)]
pub struct ErrorWrapper {
    #[serde(rename = "error")]
    message: String,
    #[serde(rename = "callstack")]
    call_stack: Vec<Frame>,
    /// The original failure, to be able to backtrace it.
    #[serde(skip)]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// The [`std::result::Result`] with [`ErrorWrapper`] as the error.
pub type Result<T> = std::result::Result<T, ErrorWrapper>;

impl ErrorWrapper {
    /// Returns the given failure as an [`ErrorWrapper`].
    ///
    /// An [`ErrorWrapper`] is returned as is, so its message and call stack are preserved.  Any
    /// other failure becomes the source of a new [`ErrorWrapper`] with an empty call stack, whose
    /// message is the failure description.
    pub fn wrap<F>(failure: F) -> Self
    where
        F: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match failure.into().downcast::<ErrorWrapper>() {
            Ok(wrapper) => *wrapper,
            Err(failure) => Self {
                message: failure.to_string(),
                call_stack: Vec::new(),
                source: Some(failure),
            },
        }
    }

    /// Description of the original failure.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// All the recorded frames, innermost first.
    pub fn call_stack(&self) -> &[Frame] {
        &self.call_stack
    }

    /// Appends a new, empty frame and returns it for filling in.
    fn add_frame(&mut self) -> &mut Frame {
        self.call_stack.push(Frame::default());
        let last = self.call_stack.len() - 1;
        &mut self.call_stack[last]
    }

    /// Records the cause on the innermost frame, unless one is recorded already.
    fn pin_cause(&mut self, cause: Option<CauseFunc>) {
        if let Some(innermost) = self.call_stack.first_mut() {
            if innermost.cause().is_none() {
                innermost.set_cause_func(cause);
            }
        }
    }
}

/// Wraps the failure with a new frame describing the calling function.
///
/// The frame records the `message`, the `file:line` of this call and the given `func`.  The
/// `cause` is recorded only if the innermost frame has none yet, otherwise it is dropped.
///
/// A failure which is not an [`ErrorWrapper`] yet is converted to one and logged as a warning.
#[track_caller]
pub fn wrap<F, M>(
    failure: F,
    func: FrameFunc,
    cause: Option<CauseFunc>,
    message: M,
) -> ErrorWrapper
where
    F: Into<Box<dyn std::error::Error + Send + Sync>>,
    M: Into<String>,
{
    wrap_at(failure, func, cause, message, Location::caller())
}

pub(crate) fn wrap_at<F, M>(
    failure: F,
    func: FrameFunc,
    cause: Option<CauseFunc>,
    message: M,
    location: &'static Location<'static>,
) -> ErrorWrapper
where
    F: Into<Box<dyn std::error::Error + Send + Sync>>,
    M: Into<String>,
{
    let mut wrapper = ErrorWrapper::wrap(failure);
    let is_bare = wrapper.call_stack.is_empty();

    wrapper
        .add_frame()
        .set_wrap_message(message.into())
        .set_wrap_place(format!("{}:{}", location.file(), location.line()))
        .set_frame_func(func);
    wrapper.pin_cause(cause);

    if is_bare {
        log::warn!(target: &location.to_string(), "{:?}", wrapper);
    }
    wrapper
}

impl std::error::Error for ErrorWrapper {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        // "as _" casts from (Error + Send + Sync) to (Error + 'static).
        self.source.as_ref().map(|source| source.as_ref() as _)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use serde_json::{json, Value};

    use super::*;
    use crate::traits::WrapError as _;

    fn rendered(error: &ErrorWrapper) -> Value {
        serde_json::from_str(&error.render()).unwrap()
    }

    fn f1(arg: i32) -> Result<()> {
        let frame = crate::frame_func!().with_args([("arg", arg)]);
        let arg = arg + 1;

        f2(arg).wrap_err(frame, None, "msg")
    }

    fn f2(arg: i32) -> Result<()> {
        let frame = crate::frame_func!().with_args([("arg", arg)]);
        let arg = arg + 1;

        f3(arg).wrap_err(
            frame,
            Some(CauseFunc::new().with_name("f3").with_args([("arg", arg)])),
            "msg",
        )
    }

    fn f3(_arg: i32) -> std::result::Result<(), std::io::Error> {
        Err(std::io::Error::other("error"))
    }

    #[test]
    fn test_nested_call_chain() {
        let error = f1(1).unwrap_err();
        let trace = rendered(&error);

        assert_eq!(trace["error"], json!("error"));
        let call_stack = trace["callstack"].as_array().unwrap();
        assert_eq!(call_stack.len(), 2);

        assert!(call_stack[0]["func_name"].as_str().unwrap().ends_with("::f2"));
        assert_eq!(call_stack[0]["func_args"], json!({"arg": 2}));
        assert_eq!(call_stack[0]["wrap_message"], json!("msg"));
        assert_eq!(
            call_stack[0]["error_cause"],
            json!({"func_name": "f3", "func_args": {"arg": 3}})
        );

        assert!(call_stack[1]["func_name"].as_str().unwrap().ends_with("::f1"));
        assert_eq!(call_stack[1]["func_args"], json!({"arg": 1}));
        assert!(call_stack[1].get("error_cause").is_none());
    }

    #[test]
    fn test_single_wrap_without_cause() {
        let error = wrap("error", FrameFunc::new("f"), None, "msg");
        let trace = rendered(&error);

        let call_stack = trace["callstack"].as_array().unwrap();
        assert_eq!(call_stack.len(), 1);
        assert!(call_stack[0].get("error_cause").is_none());
        assert!(!error.render().contains("error_cause"));
    }

    #[test]
    fn test_frames_accumulate_in_call_order() {
        let mut error = wrap("error", FrameFunc::new("frame_0"), None, "");
        for i in 1..5 {
            error = wrap(error, FrameFunc::new(format!("frame_{i}")), None, "");
        }

        assert_eq!(error.call_stack().len(), 5);
        for (i, frame) in error.call_stack().iter().enumerate() {
            assert_eq!(frame.func().name(), format!("frame_{i}"));
        }
        assert_eq!(rendered(&error)["callstack"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn test_rewrap_keeps_original_message() {
        let error = wrap("original failure", FrameFunc::new("f1"), None, "first");
        assert_eq!(error.message(), "original failure");

        let error = wrap(error, FrameFunc::new("f2"), None, "second");
        let error = wrap(error, FrameFunc::new("f3"), None, "third");

        assert_eq!(error.message(), "original failure");
        assert_eq!(rendered(&error)["error"], json!("original failure"));
    }

    #[test]
    fn test_rewrap_through_boxed_error() {
        let error = wrap("error", FrameFunc::new("f1"), None, "");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(error);

        let error = wrap(boxed, FrameFunc::new("f2"), None, "");

        assert_eq!(error.message(), "error");
        assert_eq!(error.call_stack().len(), 2);
    }

    #[test]
    fn test_first_cause_is_pinned() {
        let error = wrap(
            "error",
            FrameFunc::new("f1"),
            Some(CauseFunc::new().with_name("cause_a").with_arg("a", 1)),
            "m1",
        );
        let error = wrap(
            error,
            FrameFunc::new("f2"),
            Some(CauseFunc::new().with_name("cause_b").with_arg("b", 2)),
            "m2",
        );

        let call_stack = error.call_stack();
        assert_eq!(call_stack[0].cause().map(CauseFunc::name), Some("cause_a"));
        assert!(call_stack[1].cause().is_none());

        let trace = rendered(&error);
        assert_eq!(
            trace["callstack"][0]["error_cause"],
            json!({"func_name": "cause_a", "func_args": {"a": 1}})
        );
        assert!(trace["callstack"][1].get("error_cause").is_none());
    }

    #[test]
    fn test_later_cause_fills_empty_innermost_slot() {
        let error = wrap("error", FrameFunc::new("f1"), None, "m1");
        let error = wrap(
            error,
            FrameFunc::new("f2"),
            Some(CauseFunc::new().with_name("cause_b")),
            "m2",
        );
        let error = wrap(
            error,
            FrameFunc::new("f3"),
            Some(CauseFunc::new().with_name("cause_c")),
            "m3",
        );

        let call_stack = error.call_stack();
        assert_eq!(call_stack[0].cause().map(CauseFunc::name), Some("cause_b"));
        assert!(call_stack[1].cause().is_none());
        assert!(call_stack[2].cause().is_none());
    }

    #[test]
    fn test_frame_without_args_or_data() {
        let error = wrap("error", FrameFunc::new("f"), None, "msg");
        let frame = &rendered(&error)["callstack"][0];

        assert!(frame.get("func_args").is_none());
        assert!(frame.get("func_data").is_none());
        assert_eq!(frame["func_name"], json!("f"));
    }

    #[test]
    fn test_empty_wrap_message_is_omitted() {
        let error = wrap("error", FrameFunc::new("f"), None, "");

        assert_eq!(error.call_stack()[0].wrap_message(), None);
        assert!(rendered(&error)["callstack"][0]
            .get("wrap_message")
            .is_none());
    }

    #[test]
    fn test_wrap_place_is_call_site() {
        let (error, line) = (wrap("error", FrameFunc::new("f"), None, ""), line!());

        assert_eq!(
            error.call_stack()[0].wrap_place(),
            format!("{}:{}", file!(), line)
        );
    }

    #[test]
    fn test_wrap_err_place_is_call_site() {
        let (result, line) = (
            Err::<(), _>("error").wrap_err(FrameFunc::new("f"), None, ""),
            line!(),
        );

        assert_eq!(
            result.unwrap_err().call_stack()[0].wrap_place(),
            format!("{}:{}", file!(), line - 1)
        );
    }

    #[test]
    fn test_source() {
        let error = wrap(
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            FrameFunc::new("f"),
            None,
            "",
        );

        assert_eq!(error.message(), "missing");
        let source = error.source().unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());

        let error = wrap(error, FrameFunc::new("g"), None, "");
        assert!(error.source().is_some());
    }
}
