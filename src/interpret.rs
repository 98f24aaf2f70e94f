use indexmap::IndexMap;
use strum::IntoEnumIterator;
use strum_macros::{EnumIter, IntoStaticStr};
use thiserror::Error;

/// The project-local join helper recognized by the constrained profile.
pub const SAFE_JOIN_FN: &str = "safe_join";
/// The general pandas merge function recognized by both profiles.
pub const MERGE_FN: &str = "pd.merge";

const COMMENT_MARKER: char = '#';
const USAGE_MARKER: &str = ">>>";

/// Positional-or-keyword parameters of `pd.merge`, in signature order.
///
/// Positional arguments are assigned to these names in declaration order,
/// skipping the ones already bound by a keyword argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MergeParam {
    Left,
    Right,
    How,
    On,
    LeftOn,
    RightOn,
    LeftIndex,
    RightIndex,
    Sort,
    Suffixes,
    Copy,
    Indicator,
    Validate,
}

impl MergeParam {
    pub fn name(self) -> &'static str {
        self.into()
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::iter().find(|param| param.name() == name)
    }
}

/// Parameter values captured from a `pd.merge` invocation, keyed by
/// parameter name. Values are kept raw: quoted literals keep their quotes.
pub type MergeParams = IndexMap<MergeParam, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// A single join statement recovered from one line of notebook source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinStatement {
    pub left: String,
    pub right: String,
    pub result: String,
    pub left_key: Option<String>,
    pub right_key: Option<String>,
}

#[derive(Debug, Error)]
pub enum InterpretError {
    /// The line clearly invokes a known join function but its resulting
    /// table cannot be resolved from a `result = ...` assignment.
    #[error("couldn't interpret stmt {stmt:?}{suffix}", suffix = cell_suffix(.cell))]
    MalformedStatement { cell: Option<usize>, stmt: String },
}

fn cell_suffix(cell: &Option<usize>) -> String {
    match cell {
        Some(cell) => format!(" at cell #{cell}"),
        None => String::new(),
    }
}

impl InterpretError {
    pub(crate) fn with_cell(self, cell: usize) -> Self {
        match self {
            InterpretError::MalformedStatement { stmt, .. } => {
                InterpretError::MalformedStatement {
                    cell: Some(cell),
                    stmt,
                }
            }
        }
    }
}

/// Interprets one line of source text.
///
/// Comment lines, usage examples and lines not invoking a known join
/// function yield `Ok(None)`. The constrained profile is attempted first;
/// lines confirmed to invoke `pd.merge` then go through the general profile,
/// where a missing `result = pd.merge` assignment is an error rather than a
/// silent skip.
pub fn interpret(stmt: &str) -> Result<Option<JoinStatement>, InterpretError> {
    if stmt.starts_with(COMMENT_MARKER) || stmt.contains(USAGE_MARKER) {
        return Ok(None);
    }
    if let Some(join) = constrained(stmt) {
        return Ok(Some(join));
    }
    if stmt.contains(MERGE_FN) {
        return general(stmt).map(Some);
    }
    Ok(None)
}

/// Constrained profile: `<res> = safe_join(<left>, <right>, '<key>', ...)`
/// with the shared key as the quoted third positional argument, or
/// `<res> = pd.merge(<left>, <right>, ..., on='<key>', ...)` with the shared
/// key bound by keyword. Left and right must be positional.
pub fn constrained(stmt: &str) -> Option<JoinStatement> {
    let safe_join_call = format!("{SAFE_JOIN_FN}(");
    let merge_call = format!("{MERGE_FN}(");
    let (is_safe_join, fn_pos, call_len) = if let Some(pos) = stmt.find(&safe_join_call) {
        (true, pos, safe_join_call.len())
    } else if let Some(pos) = stmt.find(&merge_call) {
        (false, pos, merge_call.len())
    } else {
        return None;
    };

    let result = assignment_target(&stmt[..fn_pos])?.to_owned();
    let close = stmt.rfind(')')?;
    // collapse nested groups first, so commas inside chained calls never
    // leak into the argument split
    let args = collapse_groups(stmt.get(fn_pos + call_len..close)?);

    let mut fragments = args.split(',').map(str::trim);
    let left_frag = fragments.next()?;
    let right_frag = fragments.next()?;
    if left_frag.contains('=') || right_frag.contains('=') {
        return None;
    }
    let left = leading_identifier(left_frag)?.to_owned();
    let right = leading_identifier(right_frag)?.to_owned();

    let key = if is_safe_join {
        quoted_literal(fragments.next()?)?
    } else {
        let on = MergeParam::On.name();
        fragments
            .find_map(|frag| keyword_value(frag, on))
            .and_then(quoted_literal)?
    };

    Some(JoinStatement {
        left,
        right,
        result,
        left_key: Some(key.clone()),
        right_key: Some(key),
    })
}

/// General profile: multi-pass parameter recovery from an arbitrary
/// `pd.merge` invocation. Returns the raw parameter map; `choose_key` and
/// `interpret` complete the record from it.
pub fn merge_params(stmt: &str) -> Option<MergeParams> {
    let normalized = normalize(stmt)?;

    let mut kwargs: IndexMap<MergeParam, &str> = IndexMap::new();
    let mut positional: Vec<&str> = vec![];
    for frag in normalized.split(',').map(str::trim) {
        if frag.contains('=') {
            if let Some((name, value)) = assignment(frag) {
                if let Some(param) = MergeParam::from_name(name) {
                    kwargs.insert(param, value);
                }
            }
            // assignments to unknown names are discarded
        } else {
            let ident = clean_varname(frag);
            if !ident.is_empty() {
                positional.push(ident);
            }
        }
    }

    let mut params: MergeParams = MergeParam::iter()
        .filter(|param| !kwargs.contains_key(param))
        .zip(positional)
        .map(|(param, arg)| (param, arg.to_owned()))
        .collect();
    params.extend(kwargs.into_iter().map(|(param, value)| (param, value.to_owned())));
    Some(params)
}

fn general(stmt: &str) -> Result<JoinStatement, InterpretError> {
    let malformed = || InterpretError::MalformedStatement {
        cell: None,
        stmt: stmt.to_owned(),
    };

    let params = merge_params(stmt).ok_or_else(malformed)?;
    let result = resolve_result(stmt).ok_or_else(malformed)?.to_owned();
    let left = params
        .get(&MergeParam::Left)
        .map(|value| clean_varname(value))
        .filter(|ident| !ident.is_empty())
        .ok_or_else(malformed)?
        .to_owned();
    let right = params
        .get(&MergeParam::Right)
        .map(|value| clean_varname(value))
        .filter(|ident| !ident.is_empty())
        .ok_or_else(malformed)?
        .to_owned();

    let left_key = choose_key(&params, Side::Left).map(|key| unquote(key).to_owned());
    let right_key = choose_key(&params, Side::Right).map(|key| unquote(key).to_owned());

    Ok(JoinStatement {
        left,
        right,
        result,
        left_key,
        right_key,
    })
}

/// Picks the effective join key for one side: the side-specific
/// `left_on`/`right_on` if captured, else the shared `on`, else nothing.
/// Returns the raw captured value, quotes included.
pub fn choose_key(params: &MergeParams, side: Side) -> Option<&str> {
    let side_on = match side {
        Side::Left => MergeParam::LeftOn,
        Side::Right => MergeParam::RightOn,
    };
    params
        .get(&side_on)
        .or_else(|| params.get(&MergeParam::On))
        .map(String::as_str)
}

/// Reduces a `pd.merge` invocation to its comma-separable argument text:
/// everything before the opening parenthesis and after the matching close is
/// dropped along with any nested call and any `[[...]]` projection, so that
/// an argument like `t1.drop(['x'], 1)` is left as `t1.drop`.
fn normalize(stmt: &str) -> Option<String> {
    let merge_call = format!("{MERGE_FN}(");
    let start = stmt.find(&merge_call)? + merge_call.len();
    let end = stmt.rfind(')')?;
    let inner = stmt.get(start..end)?;
    Some(collapse_groups(inner))
}

fn collapse_groups(text: &str) -> String {
    strip_double_brackets(&strip_nested_calls(text))
}

fn strip_nested_calls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0u32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn strip_double_brackets(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("[[") {
        out.push_str(&rest[..open]);
        match rest[open + 2..].find("]]") {
            Some(close) => rest = &rest[open + 2 + close + 2..],
            None => {
                // unterminated projection, keep the tail untouched
                rest = &rest[open..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Finds the resulting table in the untouched statement text: the last
/// identifier assigned right before a `pd.merge` occurrence.
fn resolve_result(stmt: &str) -> Option<&str> {
    stmt.match_indices(MERGE_FN)
        .find_map(|(pos, _)| assignment_target(&stmt[..pos]))
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// The identifier assigned at the end of `prefix`, i.e. the trailing
/// `<identifier> =` with optional whitespace on both sides of the `=`.
fn assignment_target(prefix: &str) -> Option<&str> {
    let prefix = prefix.trim_end().strip_suffix('=')?.trim_end();
    let mut start = prefix.len();
    for (i, c) in prefix.char_indices().rev() {
        if !is_word(c) {
            break;
        }
        start = i;
    }
    if start == prefix.len() {
        None
    } else {
        Some(&prefix[start..])
    }
}

/// The run of word characters at the start of `text`, if any.
fn leading_identifier(text: &str) -> Option<&str> {
    let end = text.find(|c: char| !is_word(c)).unwrap_or(text.len());
    if end == 0 { None } else { Some(&text[..end]) }
}

/// Truncates an argument fragment to its bare variable name:
/// `df.drop` -> `df`, `df['siren']` -> `df`.
fn clean_varname(frag: &str) -> &str {
    let end = frag.find(['.', '[', '(']).unwrap_or(frag.len());
    frag[..end].trim()
}

/// Splits an argument fragment into a `name = value` pair, tolerating
/// whitespace on both sides of the `=`. The value runs to the end of the
/// fragment (fragments are already comma-bounded).
fn assignment(frag: &str) -> Option<(&str, &str)> {
    let name = leading_identifier(frag)?;
    let value = keyword_value(frag, name)?;
    Some((name, value))
}

fn keyword_value<'a>(frag: &'a str, name: &str) -> Option<&'a str> {
    let rest = frag.strip_prefix(name)?;
    if rest.starts_with(is_word) {
        // `name` is a prefix of a longer identifier, e.g. `on` in `left_on`
        return None;
    }
    let value = rest.trim_start().strip_prefix('=')?;
    Some(value.trim())
}

/// The content of a quoted literal at the start of a fragment.
fn quoted_literal(frag: &str) -> Option<String> {
    let mut chars = frag.chars();
    let quote = chars.next()?;
    if quote != '\'' && quote != '"' {
        return None;
    }
    let rest = chars.as_str();
    let close = rest.find(quote)?;
    Some(rest[..close].to_owned())
}

/// Strips one layer of matching quotes; applied to join keys when a record
/// is completed, for both profiles.
fn unquote(value: &str) -> &str {
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .or_else(|| {
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
        })
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_nested_calls_and_projections() {
        let stmt = "j = pd.merge(t1.drop(['useless'], 1), right=t2[['siren', 'col2']], left_index=True, on = 'id_key')";
        assert_eq!(
            normalize(stmt).unwrap(),
            "t1.drop, right=t2, left_index=True, on = 'id_key'"
        );
    }

    #[test]
    fn test_clean_varname() {
        assert_eq!(clean_varname("df.drop"), "df");
        assert_eq!(clean_varname("df['siren']"), "df");
        assert_eq!(clean_varname("df"), "df");
    }

    #[test]
    fn test_merge_params_mixes_positional_and_keyword() {
        let params =
            merge_params("j = pd.merge(t1, right=t2, how= 'left', on = 'id_key')").unwrap();
        assert_eq!(params.get(&MergeParam::Left).unwrap(), "t1");
        assert_eq!(params.get(&MergeParam::Right).unwrap(), "t2");
        assert_eq!(params.get(&MergeParam::How).unwrap(), "'left'");
        assert_eq!(params.get(&MergeParam::On).unwrap(), "'id_key'");
    }

    #[test]
    fn test_merge_params_on_does_not_match_inside_left_on() {
        let params = merge_params("j = pd.merge(a, b, left_on='x', right_on='y')").unwrap();
        assert!(params.get(&MergeParam::On).is_none());
        assert_eq!(params.get(&MergeParam::LeftOn).unwrap(), "'x'");
        assert_eq!(params.get(&MergeParam::RightOn).unwrap(), "'y'");
    }

    #[test]
    fn test_assignment_target() {
        assert_eq!(assignment_target("table_c = ").unwrap(), "table_c");
        assert_eq!(assignment_target("table_c=").unwrap(), "table_c");
        assert!(assignment_target("table_c ").is_none());
        assert!(assignment_target(" = ").is_none());
    }

    #[test]
    fn test_constrained_rejects_keyword_left_right() {
        assert!(constrained("j = pd.merge(left=a, right=b, on='k')").is_none());
    }

    #[test]
    fn test_constrained_falls_through_on_keyword_right_with_nested_call() {
        // commas inside `.drop(...)` must not produce a phantom right table
        let stmt = "j = pd.merge(t1.drop(['useless'], 1), right=t2[['siren', 'col2']], left_index=True, on = 'id_key')";
        assert!(constrained(stmt).is_none());

        let join = interpret(stmt).unwrap().unwrap();
        assert_eq!(join.left, "t1");
        assert_eq!(join.right, "t2");
        assert_eq!(join.result, "j");
        assert_eq!(join.left_key.as_deref(), Some("id_key"));
    }

    #[test]
    fn test_constrained_collapses_chained_call_arguments() {
        let join =
            constrained("t = safe_join(a.head(), b.rename(x, y), 'k')").unwrap();
        assert_eq!(join.left, "a");
        assert_eq!(join.right, "b");
        assert_eq!(join.left_key.as_deref(), Some("k"));
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("'num_contrat'"), "num_contrat");
        assert_eq!(unquote("\"num_contrat\""), "num_contrat");
        assert_eq!(unquote("num_contrat"), "num_contrat");
        assert_eq!(unquote("'mismatched\""), "'mismatched\"");
    }
}
