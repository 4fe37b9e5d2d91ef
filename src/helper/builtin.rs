//! Helpers available in every [`Engine`][`crate::Engine`].
use super::{Arguments, BlockHelper, Helper, Logger, Options};
use crate::{
    render::{is_truthy, resolve_segment, Iteration},
    report::error_arity,
    Error, Pipe, Value,
};
use log::{Level, LevelFilter};
use parking_lot::RwLock;
use std::{borrow::Cow, str::FromStr, sync::Arc};

/// The sink shared by an [`Engine`][`crate::Engine`] and its `log` helper.
pub(crate) type LoggerSlot = Arc<RwLock<Option<Arc<dyn Logger>>>>;

type BlockFn = fn(&mut Pipe, &Options, &Value, &Arguments) -> Result<(), Error>;
type HelperFn = fn(&mut Pipe, &Value, &Arguments) -> Result<(), Error>;

/// Block helpers registered by [`builtin_helpers`].
const BLOCK_HELPERS: [(&str, BlockFn); 4] = [
    ("if", if_helper),
    ("unless", unless_helper),
    ("each", each_helper),
    ("with", with_helper),
];

/// Plain helpers registered by [`builtin_helpers`].
const HELPERS: [(&str, HelperFn); 1] = [("lookup", lookup_helper)];

/// A registered helper of either kind.
#[derive(Clone)]
pub(crate) enum Registered {
    Helper(Arc<dyn Helper>),
    Block(Arc<dyn BlockHelper>),
}

/// Return the built-in helpers, with the `log` helper writing to whatever
/// sink the slot holds when it is called.
pub(crate) fn builtin_helpers(
    logger: LoggerSlot,
    threshold: LevelFilter,
) -> Vec<(&'static str, Registered)> {
    let mut helpers: Vec<(&str, Registered)> = BLOCK_HELPERS
        .into_iter()
        .map(|(name, helper)| (name, Registered::Block(Arc::new(helper))))
        .collect();
    helpers.extend(
        HELPERS
            .into_iter()
            .map(|(name, helper)| (name, Registered::Helper(Arc::new(helper)))),
    );
    helpers.push((
        "log",
        Registered::Helper(Arc::new(LogHelper { logger, threshold })),
    ));

    helpers
}

/// Return the only positional argument.
///
/// # Errors
///
/// Returns an [`Error`] if the helper did not receive exactly one argument.
fn single<'a>(name: &str, arguments: &'a Arguments) -> Result<&'a Value, Error> {
    match arguments.positional() {
        [value] => Ok(value),
        other => Err(error_arity(name, 1, other.len())),
    }
}

/// `{{#if condition}} ... {{else}} ... {{/if}}`
fn if_helper(
    pipe: &mut Pipe,
    options: &Options,
    _: &Value,
    arguments: &Arguments,
) -> Result<(), Error> {
    if is_truthy(single("if", arguments)?) {
        options.render(pipe)
    } else {
        options.inverse(pipe)
    }
}

/// `{{#unless condition}} ... {{else}} ... {{/unless}}`
fn unless_helper(
    pipe: &mut Pipe,
    options: &Options,
    _: &Value,
    arguments: &Arguments,
) -> Result<(), Error> {
    if is_truthy(single("unless", arguments)?) {
        options.inverse(pipe)
    } else {
        options.render(pipe)
    }
}

/// `{{#each items}} ... {{else}} ... {{/each}}`
///
/// Renders the body once per entry. Sequences are keyed by position,
/// mappings by their own keys and records by member name. A target with no
/// entries, or one that does not enumerate, renders the inverse.
fn each_helper(
    pipe: &mut Pipe,
    options: &Options,
    _: &Value,
    arguments: &Arguments,
) -> Result<(), Error> {
    let target = single("each", arguments)?;
    let entries = match target.entries() {
        Some(entries) if !entries.is_empty() => entries,
        _ => return options.inverse(pipe),
    };

    let len = entries.len();
    for (index, (key, item)) in entries.into_iter().enumerate() {
        options.render_item(pipe, &item, Iteration::new(key, index, len))?;
    }

    Ok(())
}

/// `{{#with person}} ... {{else}} ... {{/with}}`
fn with_helper(
    pipe: &mut Pipe,
    options: &Options,
    _: &Value,
    arguments: &Arguments,
) -> Result<(), Error> {
    let target = single("with", arguments)?;
    if is_truthy(target) {
        options.render_with(pipe, target)
    } else {
        options.inverse(pipe)
    }
}

/// `{{lookup object key}}`
fn lookup_helper(pipe: &mut Pipe, _: &Value, arguments: &Arguments) -> Result<(), Error> {
    let [target, key] = arguments.positional() else {
        return Err(error_arity("lookup", 2, arguments.len()));
    };
    if let Some(value) = resolve_segment(Cow::Borrowed(target), &key.to_text()) {
        pipe.write_value(&value)?;
    }

    Ok(())
}

/// `{{log "message" value level="warn"}}`
///
/// Writes the text form of each positional argument to the sink. Messages
/// more verbose than the threshold are dropped.
struct LogHelper {
    logger: LoggerSlot,
    threshold: LevelFilter,
}

impl Helper for LogHelper {
    fn call(&self, _: &mut Pipe, _: &Value, arguments: &Arguments) -> Result<(), Error> {
        let Some(logger) = self.logger.read().clone() else {
            return Ok(());
        };

        let level = arguments
            .named("level")
            .and_then(Value::as_str)
            .and_then(|level| Level::from_str(level).ok())
            .unwrap_or(Level::Info);
        if level > self.threshold {
            return Ok(());
        }

        for argument in arguments.positional() {
            logger.log(level, &argument.to_text());
        }

        Ok(())
    }
}

/// A [`Logger`] that forwards messages to the [`log`] crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: "stache", level, "{message}");
    }
}
