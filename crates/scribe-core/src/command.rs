#![forbid(unsafe_code)]

//! Closed set of formatting commands and their routing table.
//!
//! Every command the editor understands is a [`FormatCommand`] variant. A
//! single static table ([`COMMANDS`]) maps each variant to the name the host
//! engine understands, whether it takes a value, whether its state can be
//! queried, and where it is routed:
//!
//! | Route | Handled by |
//! |-------|------------|
//! | [`Route::Host`] | host `exec_command` primitive |
//! | [`Route::History`] | the snapshot store (undo / redo playback) |
//!
//! String names only appear at the two edges: [`CommandRequest::parse`] for
//! callers that speak host names, and [`CommandSpec::host_name`] when the
//! executor talks to the host.

use std::fmt;
use std::str::FromStr;

use crate::error::CommandError;

/// A formatting command.
///
/// Discriminants index [`COMMANDS`]; keep the two in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatCommand {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
    OrderedList,
    UnorderedList,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Indent,
    Outdent,
    CreateLink,
    Unlink,
    ForeColor,
    BackColor,
    FontName,
    FontSize,
    FormatBlock,
    InsertText,
    InsertHorizontalRule,
    InsertImage,
    RemoveFormat,
    Undo,
    Redo,
}

/// Whether a command takes a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// The value, if given, is ignored.
    None,
    /// The command is meaningless without a value (color, URL, tag...).
    Required,
}

/// Where a command is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Host,
    History,
}

/// Routing entry for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: FormatCommand,
    /// Canonical editor-facing name.
    pub name: &'static str,
    /// Name passed to the host's command primitive.
    pub host_name: &'static str,
    pub value: ValueKind,
    /// Whether `query_command_state` is meaningful for this command.
    pub queryable: bool,
    pub route: Route,
}

const fn host(
    command: FormatCommand,
    name: &'static str,
    host_name: &'static str,
    value: ValueKind,
    queryable: bool,
) -> CommandSpec {
    CommandSpec {
        command,
        name,
        host_name,
        value,
        queryable,
        route: Route::Host,
    }
}

const fn history(command: FormatCommand, name: &'static str) -> CommandSpec {
    CommandSpec {
        command,
        name,
        host_name: name,
        value: ValueKind::None,
        queryable: false,
        route: Route::History,
    }
}

use FormatCommand as F;
use ValueKind::{None as NoValue, Required};

/// The routing table.
pub const COMMANDS: [CommandSpec; 27] = [
    host(F::Bold, "bold", "bold", NoValue, true),
    host(F::Italic, "italic", "italic", NoValue, true),
    host(F::Underline, "underline", "underline", NoValue, true),
    host(F::Strikethrough, "strikethrough", "strikeThrough", NoValue, true),
    host(F::Subscript, "subscript", "subscript", NoValue, true),
    host(F::Superscript, "superscript", "superscript", NoValue, true),
    host(F::OrderedList, "orderedList", "insertOrderedList", NoValue, true),
    host(F::UnorderedList, "unorderedList", "insertUnorderedList", NoValue, true),
    host(F::AlignLeft, "alignLeft", "justifyLeft", NoValue, true),
    host(F::AlignCenter, "alignCenter", "justifyCenter", NoValue, true),
    host(F::AlignRight, "alignRight", "justifyRight", NoValue, true),
    host(F::AlignJustify, "alignJustify", "justifyFull", NoValue, true),
    host(F::Indent, "indent", "indent", NoValue, false),
    host(F::Outdent, "outdent", "outdent", NoValue, false),
    host(F::CreateLink, "link", "createLink", Required, false),
    host(F::Unlink, "unlink", "unlink", NoValue, false),
    host(F::ForeColor, "foreColor", "foreColor", Required, false),
    host(F::BackColor, "backColor", "hiliteColor", Required, false),
    host(F::FontName, "fontName", "fontName", Required, false),
    host(F::FontSize, "fontSize", "fontSize", Required, false),
    host(F::FormatBlock, "formatBlock", "formatBlock", Required, false),
    host(F::InsertText, "insertText", "insertText", Required, false),
    host(F::InsertHorizontalRule, "horizontalRule", "insertHorizontalRule", NoValue, false),
    host(F::InsertImage, "image", "insertImage", Required, false),
    host(F::RemoveFormat, "removeFormat", "removeFormat", NoValue, false),
    history(F::Undo, "undo"),
    history(F::Redo, "redo"),
];

impl FormatCommand {
    /// Routing entry for this command.
    #[must_use]
    pub fn spec(self) -> &'static CommandSpec {
        &COMMANDS[self as usize]
    }

    /// Canonical editor-facing name.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Name the host engine understands.
    #[must_use]
    pub fn host_name(self) -> &'static str {
        self.spec().host_name
    }

    #[must_use]
    pub fn requires_value(self) -> bool {
        self.spec().value == ValueKind::Required
    }

    #[must_use]
    pub fn is_queryable(self) -> bool {
        self.spec().queryable
    }

    #[must_use]
    pub fn is_history(self) -> bool {
        self.spec().route == Route::History
    }

    /// Resolve a canonical or host name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        COMMANDS
            .iter()
            .find(|spec| {
                spec.name.eq_ignore_ascii_case(name) || spec.host_name.eq_ignore_ascii_case(name)
            })
            .map(|spec| spec.command)
    }

    /// All commands in table order.
    pub fn all() -> impl Iterator<Item = Self> {
        COMMANDS.iter().map(|spec| spec.command)
    }
}

impl fmt::Display for FormatCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormatCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| CommandError::unsupported(s))
    }
}

/// A formatting operation with its optional parameter. Built per invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub command: FormatCommand,
    pub value: Option<String>,
}

impl CommandRequest {
    #[must_use]
    pub fn new(command: FormatCommand) -> Self {
        Self {
            command,
            value: None,
        }
    }

    #[must_use]
    pub fn with_value(command: FormatCommand, value: impl Into<String>) -> Self {
        Self {
            command,
            value: Some(value.into()),
        }
    }

    /// Build a request from a command name as a toolbar or shortcut table
    /// would pass it.
    pub fn parse(name: &str, value: Option<&str>) -> Result<Self, CommandError> {
        let command = name.parse::<FormatCommand>()?;
        Ok(Self {
            command,
            value: value.map(str::to_owned),
        })
    }

    /// The value to hand to the host, if the command takes one.
    ///
    /// Fails when a required value is missing or blank.
    pub fn host_value(&self) -> Result<Option<&str>, CommandError> {
        match self.command.spec().value {
            ValueKind::None => Ok(None),
            ValueKind::Required => match self.value.as_deref() {
                Some(v) if !v.trim().is_empty() => Ok(Some(v)),
                _ => Err(CommandError::MissingValue {
                    command: self.command,
                }),
            },
        }
    }
}

impl From<FormatCommand> for CommandRequest {
    fn from(command: FormatCommand) -> Self {
        Self::new(command)
    }
}
