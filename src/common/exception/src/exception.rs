// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![allow(non_snake_case)]

use std::fmt::Debug;
use std::fmt::Formatter;

use thiserror::Error;

#[derive(Error, Clone, PartialEq, Eq)]
#[error("Code: {code}, displayText = {display_text}.")]
pub struct ErrorCode {
    code: u16,
    display_text: String,
}

pub type Result<T> = std::result::Result<T, ErrorCode>;

impl ErrorCode {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.display_text
    }

    /// Prefix the display text with additional context, keeping the code.
    pub fn add_message(self, msg: impl AsRef<str>) -> Self {
        Self {
            code: self.code,
            display_text: format!("{}, {}", msg.as_ref(), self.display_text),
        }
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Code: {}, displayText = {}.",
            self.code, self.display_text
        )
    }
}

macro_rules! as_item {
    ($i:item) => {
        $i
    };
}

macro_rules! build_exceptions {
    ($($body:ident($code:expr)),* $(,)?) => {
        as_item! {
            impl ErrorCode {
                $(
                pub fn $body(display_text: impl Into<String>) -> ErrorCode {
                    ErrorCode {
                        code: $code,
                        display_text: display_text.into(),
                    }
                })*
            }
        }
    }
}

build_exceptions! {
    Ok(0),
    UnImplement(2),
    BadArguments(6),
    IllegalDataType(7),
    UnknownFunction(8),
    BadDataValueType(10),
    LogicalError(15),
    UnknownColumn(16),
    AmbiguousColumnName(17),
    Overflow(18),
    UnknownVariable(19),
    DivideByZero(20),

    UnknownException(1000),
}
