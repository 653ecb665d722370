//! # Common Datatypes
//!
//! A process-wide registry, namespaced `common`, holding `email`, `url` and
//! `date`. It is built once on first use and linked into every registry
//! created through [`crate::define`], [`crate::define_many`] or
//! [`Registry::link_common`].

use std::sync::OnceLock;

use serde_json::{json, Value};
use shape_core::ShapeError;

use crate::registry::Registry;

/// Namespace and link prefix of the common registry.
pub const COMMON_PREFIX: &str = "common";

/// `http`/`https` URLs.
pub const URL_PATTERN: &str =
    r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

/// `YYYY-MM-DD`, with any single non-digit separator or none.
pub const DATE_PATTERN: &str = r"^(\d{4})\D?(0[1-9]|1[0-2])\D?([12]\d|0[1-9]|3[01])$";

static COMMON: OnceLock<Result<Registry, ShapeError>> = OnceLock::new();

/// Address pattern following the RFC 5322 `addr-spec` grammar.
pub fn email_pattern() -> String {
    let wsp = r"[ \t]";
    let crlf = r"(?:\r\n)";
    let no_ws_ctl = r"\x01-\x08\x0b\x0c\x0f-\x1f\x7f";
    let quoted_pair = r"(?:\\.)";
    let fws = format!(r"(?:(?:{wsp}*{crlf})?{wsp}+)");
    let ctext = format!(r"[{no_ws_ctl}\x21-\x27\x2a-\x5b\x5d-\x7e]");
    let ccontent = format!(r"(?:{ctext}|{quoted_pair})");
    let comment = format!(r"\((?:{fws}?{ccontent})*{fws}?\)");
    let cfws = format!(r"(?:{fws}?{comment})*(?:{fws}?{comment}|{fws})");
    let atext = r"[\w!#$%&'*+\-/=?^`{|}~]";
    let dot_atom_text = format!(r"{atext}+(?:\.{atext}+)*");
    let dot_atom = format!(r"{cfws}?{dot_atom_text}{cfws}?");
    let qtext = format!(r"[{no_ws_ctl}\x21\x23-\x5b\x5d-\x7e]");
    let qcontent = format!(r"(?:{qtext}|{quoted_pair})");
    let quoted_string = format!(r#"{cfws}?"(?:{fws}?{qcontent})*{fws}?"{cfws}?"#);
    let local_part = format!(r"(?:{dot_atom}|{quoted_string})");
    let dtext = format!(r"[{no_ws_ctl}\x21-\x5a\x5e-\x7e]");
    let dcontent = format!(r"(?:{dtext}|{quoted_pair})");
    let domain_literal = format!(r"{cfws}?\[(?:{fws}?{dcontent})*{fws}?\]{cfws}?");
    let domain = format!(r"(?:{dot_atom}|{domain_literal})");
    format!(r"^{local_part}@{domain}$")
}

fn definitions() -> Value {
    json!({
        "email": {"type": "string", "regex": email_pattern(), "name": "email"},
        "url": {"type": "string", "regex": URL_PATTERN, "name": "url"},
        "date": {"type": "string", "regex": DATE_PATTERN, "name": "date"},
    })
}

fn build() -> Result<Registry, ShapeError> {
    let registry = Registry::with_namespace(COMMON_PREFIX);
    if let Value::Object(map) = definitions() {
        registry.define_many(&map)?;
    }
    Ok(registry)
}

/// The shared common registry.
pub fn common() -> Result<Registry, ShapeError> {
    COMMON.get_or_init(build).clone()
}
