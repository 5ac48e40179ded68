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

impl crate::ErrorWrapper {
    /// Renders the whole error, i.e. the original failure description and the call stack, as a
    /// single line of JSON.
    ///
    /// Rendering never fails.  Values which could not be serialized were already replaced by
    /// [`NON_SERIALIZABLE_VALUE`][crate::NON_SERIALIZABLE_VALUE] when they were recorded.
    pub fn render(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            serde_json::json!({ "error": self.message(), "callstack": [] }).to_string()
        })
    }
}

// Writes the rendered trace.
impl std::fmt::Display for crate::ErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

// Same as `Display`, so that logging with `{:?}` also shows the whole trace.
impl std::fmt::Debug for crate::ErrorWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
