use fxhash::FxHashMap;
use minijinja::value::Rest;
use minijinja::{Error, ErrorKind, Value};
use std::sync::Arc;

/// Route name to axum style path pattern (`/user/{id}`).
pub(crate) type Routes = Arc<FxHashMap<String, String>>;

pub(crate) fn itoa(v: i64) -> String {
    v.to_string()
}

/// Stands in for an injected function until a request binds it.
pub(crate) fn placeholder(
    name: String,
) -> impl Fn(Rest<Value>) -> Result<Value, Error> + Send + Sync + 'static {
    move |_| {
        Err(Error::new(
            ErrorKind::InvalidOperation,
            format!("{name} is only available while rendering a request"),
        ))
    }
}

/// Builds the path of route `name`, filling its `{..}` captures with `params` in order.
///
/// An unknown route yields an empty string so a page still renders.
pub(crate) fn url_to(routes: &Routes, name: &str, params: &[Value]) -> Result<String, Error> {
    let Some(pattern) = routes.get(name) else {
        tracing::warn!(route = name, ?params, "no such route");
        return Ok(String::new());
    };

    let mut args = params.iter();
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern.as_str();

    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|i| open + i) else {
            break;
        };
        out.push_str(&rest[..open]);

        let capture = &rest[open + 1..close];
        let value = args.next().ok_or_else(|| {
            Error::new(
                ErrorKind::MissingArgument,
                format!("route {name:?} needs a value for {{{capture}}}"),
            )
        })?;
        let text = param_text(name, value)?;
        if capture.starts_with('*') {
            let segments: Vec<_> = text.split('/').map(urlencoding::encode).collect();
            out.push_str(&segments.join("/"));
        } else {
            out.push_str(&urlencoding::encode(&text));
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);

    if args.next().is_some() {
        return Err(Error::new(
            ErrorKind::TooManyArguments,
            format!("route {name:?} got more params than it has captures"),
        ));
    }
    Ok(out)
}

fn param_text(route: &str, value: &Value) -> Result<String, Error> {
    if let Some(s) = value.as_str() {
        return Ok(s.to_owned());
    }
    if let Some(n) = value.as_i64() {
        return Ok(n.to_string());
    }
    Err(Error::new(
        ErrorKind::InvalidOperation,
        format!("invalid param {value} ({:?}) for route {route:?}", value.kind()),
    ))
}
