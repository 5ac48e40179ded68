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

//! Descriptors a call site builds to describe itself before wrapping an error.

use std::collections::BTreeMap;

use serde::Serialize;

/// Placeholder recorded instead of an argument or data value which cannot be serialized.
pub const NON_SERIALIZABLE_VALUE: &str = "non-serializable";

/// Arguments of a function, keyed by the argument name.
pub type FuncArgs = BTreeMap<String, serde_json::Value>;

/// Local state of a function at the point of failure, keyed by a descriptive name.
pub type FuncData = BTreeMap<String, serde_json::Value>;

/// Converts a value into its serialized form for [`FuncArgs`] or [`FuncData`].
///
/// Values which cannot be serialized are replaced by [`NON_SERIALIZABLE_VALUE`], so that the
/// rendering of the error never fails because of a single value.
pub fn to_func_value<V>(value: &V) -> serde_json::Value
where
    V: Serialize + ?Sized,
{
    serde_json::to_value(value)
        .unwrap_or_else(|_| serde_json::Value::String(NON_SERIALIZABLE_VALUE.to_owned()))
}

fn to_func_values<I, K, V>(entries: I) -> BTreeMap<String, serde_json::Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Serialize,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), to_func_value(&value)))
        .collect()
}

/// Description of the function which is wrapping an error, i.e. the function the frame belongs
/// to.
///
/// The name is usually captured with the [`frame_func!`][crate::frame_func] macro, while the
/// arguments and data are supplied by the call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameFunc {
    #[serde(rename = "func_name")]
    name: String,
    #[serde(rename = "func_args", skip_serializing_if = "BTreeMap::is_empty")]
    args: FuncArgs,
    #[serde(rename = "func_data", skip_serializing_if = "BTreeMap::is_empty")]
    data: FuncData,
}

impl FrameFunc {
    /// Creates a [`FrameFunc`] with the given qualified function name, and no arguments or data.
    ///
    /// Prefer the [`frame_func!`][crate::frame_func] macro, which fills in the name of the
    /// enclosing function.
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            name: name.into(),
            args: FuncArgs::new(),
            data: FuncData::new(),
        }
    }

    /// Replaces the arguments of the function.
    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.args = to_func_values(args);
        self
    }

    /// Sets a single argument of the function, keeping the other ones.
    pub fn with_arg<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Serialize,
    {
        self.args.insert(key.into(), to_func_value(&value));
        self
    }

    /// Merges the given entries into the function data.
    ///
    /// New keys are added and the existing keys are overwritten.
    pub fn with_data<I, K, V>(mut self, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.data.extend(to_func_values(data));
        self
    }

    /// Merges a single entry into the function data.
    pub fn with_datum<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Serialize,
    {
        self.data.insert(key.into(), to_func_value(&value));
        self
    }

    /// Qualified name of the function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments of the function.
    pub fn args(&self) -> &FuncArgs {
        &self.args
    }

    /// Data describing the local state of the function.
    pub fn data(&self) -> &FuncData {
        &self.data
    }
}

/// Description of the function which was called and failed, as seen by the wrapping call site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CauseFunc {
    #[serde(rename = "func_name")]
    name: String,
    #[serde(rename = "func_args", skip_serializing_if = "BTreeMap::is_empty")]
    args: FuncArgs,
}

impl CauseFunc {
    /// Creates an empty [`CauseFunc`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name of the failed function.
    pub fn with_name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    /// Replaces the arguments the failed function was called with.
    pub fn with_args<I, K, V>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        self.args = to_func_values(args);
        self
    }

    /// Sets a single argument the failed function was called with.
    pub fn with_arg<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Serialize,
    {
        self.args.insert(key.into(), to_func_value(&value));
        self
    }

    /// Name of the failed function.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arguments the failed function was called with.
    pub fn args(&self) -> &FuncArgs {
        &self.args
    }
}

/// A single wrap of an error, as recorded in the [`ErrorWrapper`][crate::ErrorWrapper] call
/// stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "String::is_empty")]
    wrap_message: String,
    wrap_place: String,
    #[serde(flatten)]
    func: FrameFunc,
    #[serde(rename = "error_cause", skip_serializing_if = "Option::is_none")]
    cause: Option<CauseFunc>,
}

impl Frame {
    /// Message given to the wrap, if any.
    pub fn wrap_message(&self) -> Option<&str> {
        Some(self.wrap_message.as_str()).filter(|message| !message.is_empty())
    }

    /// Location of the wrap call, formatted as `file:line`.
    pub fn wrap_place(&self) -> &str {
        &self.wrap_place
    }

    /// The function which did the wrap.
    pub fn func(&self) -> &FrameFunc {
        &self.func
    }

    /// The failed function, as named by the wrapping call site.
    pub fn cause(&self) -> Option<&CauseFunc> {
        self.cause.as_ref()
    }

    pub(crate) fn set_wrap_message(&mut self, message: String) -> &mut Self {
        self.wrap_message = message;
        self
    }

    pub(crate) fn set_wrap_place(&mut self, place: String) -> &mut Self {
        self.wrap_place = place;
        self
    }

    pub(crate) fn set_frame_func(&mut self, func: FrameFunc) -> &mut Self {
        self.func = func;
        self
    }

    pub(crate) fn set_cause_func(&mut self, cause: Option<CauseFunc>) -> &mut Self {
        self.cause = cause;
        self
    }
}

/// Resolves the path of the function enclosing the macro invocation.
///
/// Implementation detail of [`function_name!`][crate::function_name].
#[doc(hidden)]
pub fn __enclosing_function<T>(_: T) -> &'static str {
    let name = std::any::type_name::<T>();
    let mut name = name.strip_suffix("::__here").unwrap_or(name);
    while let Some(outer) = name.strip_suffix("::{{closure}}") {
        name = outer;
    }
    name
}

/// Expands to the qualified path of the enclosing function, as a `&'static str`.
///
/// Closures are skipped over, so the name is always the one of the named function containing
/// the invocation.
///
/// ```
/// fn parse_header() -> &'static str {
///     bhtrace::function_name!()
/// }
///
/// assert!(parse_header().ends_with("::parse_header"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __here() {}
        $crate::__enclosing_function(__here)
    }};
}

/// Creates a [`FrameFunc`] named after the enclosing function.
///
/// ```
/// fn load_key(id: u32) -> bhtrace::FrameFunc {
///     bhtrace::frame_func!().with_arg("id", id)
/// }
///
/// assert!(load_key(7).name().ends_with("::load_key"));
/// ```
#[macro_export]
macro_rules! frame_func {
    () => {
        $crate::FrameFunc::new($crate::function_name!())
    };
}

/// Builds a [`FuncArgs`] (or, equivalently, [`FuncData`]) map out of `key => value` pairs.
///
/// Values may be of different types, as long as each implements [`serde::Serialize`].
///
/// ```
/// let args = bhtrace::func_args! { "user" => "alice", "attempt" => 3 };
/// assert_eq!(args["user"], "alice");
/// assert_eq!(args["attempt"], 3);
/// ```
#[macro_export]
macro_rules! func_args {
    () => {
        $crate::FuncArgs::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::FuncArgs::new();
        $(
            args.insert(::std::string::String::from($key), $crate::to_func_value(&$value));
        )+
        args
    }};
}
