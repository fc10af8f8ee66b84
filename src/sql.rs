//! GRANT statement rendering.
//!
//! Used by the in-memory service to produce a preview the same shape the
//! server would: one statement per (object, grantee), with grant-option
//! privileges split into their own `WITH GRANT OPTION` statement.

use crate::object::DatabaseObject;
use crate::privilege::{PrivilegeEntry, PrivilegeGrantRow};
use crate::service::GrantRequest;

/// Double-quote an identifier unless it is a plain lower-case identifier.
pub fn quote_ident(ident: &str) -> String {
    let plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$');
    if plain {
        ident.to_string()
    } else {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }
}

fn quote_grantee(grantee: &str) -> String {
    if grantee.eq_ignore_ascii_case("public") {
        "PUBLIC".to_string()
    } else {
        quote_ident(grantee)
    }
}

fn object_target(obj: &DatabaseObject) -> Option<String> {
    let kind = obj.normalized_class().sql_kind()?;
    let mut target = format!("{} {}.{}", kind, quote_ident(&obj.schema), quote_ident(&obj.name));
    if obj.object_type.is_function_like() {
        target.push('(');
        target.push_str(obj.arg_signature.as_deref().unwrap_or_default());
        target.push(')');
    }
    Some(target)
}

fn keywords(entries: &[&PrivilegeEntry]) -> String {
    entries
        .iter()
        .map(|p| p.code.keyword())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_row(target: &str, row: &PrivilegeGrantRow, out: &mut Vec<String>) {
    let Some(grantee) = row.grantee() else {
        return;
    };
    let grantee = quote_grantee(grantee);

    let (with_grant, plain): (Vec<_>, Vec<_>) = row.granted().partition(|p| p.with_grant);

    if !plain.is_empty() {
        out.push(format!(
            "GRANT {} ON {} TO {};",
            keywords(&plain),
            target,
            grantee
        ));
    }
    if !with_grant.is_empty() {
        out.push(format!(
            "GRANT {} ON {} TO {} WITH GRANT OPTION;",
            keywords(&with_grant),
            target,
            grantee
        ));
    }
}

/// Render the statements for a request, objects outermost.
/// Objects with no SQL kind are skipped.
pub fn render_grants(request: &GrantRequest) -> String {
    let mut out = Vec::new();
    for obj in &request.objects {
        let Some(target) = object_target(obj) else {
            continue;
        };
        for row in &request.acl {
            render_row(&target, row, &mut out);
        }
    }
    out.join("\n")
}
