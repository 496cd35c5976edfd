//! # Render
//!
//! HTML rendering with template inheritance on top of `minijinja`.
//!
//! Every leaf template is rendered through a layout: the first of the
//! [`RendererBuilder::base_templates`] (default `base.tmpl`). A leaf that does not start with
//! its own `{% extends %}` tag extends the layout and only overrides its blocks. The other
//! base templates are available to `{% include %}` and `{% import %}`.
//!
//! * [`RendererBuilder::reload`] re-parses all templates before each render.
//! * [`RendererBuilder::inject`] binds functions to the request being rendered.
//! * `itoa` and `url_to(route, params...)` are always available.
//!
//! ```rust
//! use axum::http::{Request, StatusCode};
//! use cryptix_render::{MemorySource, Renderer};
//!
//! let source = MemorySource::new()
//!     .with("base.tmpl", "<title>{% block title %}{% endblock %}</title>")
//!     .with("hello.tmpl", "{% block title %}Hello {{ name }}{% endblock %}");
//!
//! let renderer = Renderer::builder(source).add_templates(["hello.tmpl"]).build().unwrap();
//!
//! let (parts, ()) = Request::new(()).into_parts();
//! let data = serde_json::json!({ "name": "you" });
//! let resp = renderer.render(&parts, "hello.tmpl", StatusCode::OK, &data).unwrap();
//! assert_eq!(resp.status(), StatusCode::OK);
//! ```

mod error;
mod funcs;
mod pool;
mod source;

pub use error::{RenderError, RenderErrorExt};
pub use minijinja::Value;
pub use source::{AssetSource, DirSource, MemorySource};

use axum::body::Bytes;
use axum::http::request::Parts;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use fxhash::FxHashMap;
use minijinja::value::Rest;
use minijinja::{AutoEscape, Environment};
use parking_lot::RwLock;
use pool::BufferPool;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The layout used unless [`RendererBuilder::base_templates`] says otherwise.
pub const DEFAULT_BASE: &str = "base.tmpl";

const POOL_SIZE: usize = 64;

/// Produces the value of an injected template global for one request.
pub type Injector = Arc<dyn Fn(&Parts) -> Value + Send + Sync>;

struct Config {
    base: Vec<String>,
    templates: Vec<String>,
    funcs: Vec<(String, Value)>,
    injections: Vec<(String, Injector)>,
    routes: FxHashMap<String, String>,
    reload: bool,
}

/// Configures a [`Renderer`].
pub struct RendererBuilder {
    source: Arc<dyn AssetSource>,
    config: Config,
}

impl fmt::Debug for RendererBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base", &self.base)
            .field("templates", &self.templates)
            .field("funcs", &self.funcs.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("injections", &self.injections.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("routes", &self.routes)
            .field("reload", &self.reload)
            .finish()
    }
}

impl RendererBuilder {
    /// Replaces the base templates. The first one is the layout.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn base_templates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.base = names.into_iter().map(Into::into).collect();
        self
    }

    /// Adds leaf templates that can be passed to [`Renderer::render`].
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn add_templates<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.templates.extend(names.into_iter().map(Into::into));
        self
    }

    /// Adds a global function or value, e.g. `Value::from_function(|n: i64| n * 2)`.
    ///
    /// Replaces a built-in of the same name.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn func(mut self, name: impl Into<String>, value: Value) -> Self {
        self.config.funcs.push((name.into(), value));
        self
    }

    /// Adds every entry of a function map.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn funcs<I, S>(mut self, funcs: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        self.config.funcs.extend(funcs.into_iter().map(|(n, v)| (n.into(), v)));
        self
    }

    /// Binds global `name` per request to the value `factory` returns for the request.
    ///
    /// Outside of [`Renderer::render`] calling `name` fails.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn inject<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Parts) -> Value + Send + Sync + 'static,
    {
        self.config.injections.push((name.into(), Arc::new(factory)));
        self
    }

    /// Names a path pattern (`/user/{id}`) for the `url_to` template function.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub fn route(mut self, name: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.config.routes.insert(name.into(), pattern.into());
        self
    }

    /// Re-parses all templates before every render.
    #[must_use = "The builder must be configured before it can be used to build the renderer."]
    pub const fn reload(mut self, enabled: bool) -> Self {
        self.config.reload = enabled;
        self
    }

    /// Parses all templates.
    ///
    /// # Errors
    /// [`RenderError::InvalidConfiguration`] without base templates, [`RenderError::Asset`]
    /// for missing files and [`RenderError::Template`] for syntax errors.
    pub fn build(self) -> Result<Renderer, RenderError> {
        if self.config.base.is_empty() {
            return Err(RenderError::InvalidConfiguration {
                message: "no base templates".into(),
                context: None,
            });
        }

        let routes = Arc::new(self.config.routes.clone());
        let env = parse(&self.config, &routes, self.source.as_ref())?;
        tracing::debug!(
            base = ?self.config.base,
            templates = self.config.templates.len(),
            reload = self.config.reload,
            "templates parsed"
        );

        Ok(Renderer {
            inner: Arc::new(Inner {
                source: self.source,
                config: self.config,
                routes,
                env: RwLock::new(Arc::new(env)),
                pool: BufferPool::new(POOL_SIZE),
            }),
        })
    }
}

struct Inner {
    source: Arc<dyn AssetSource>,
    config: Config,
    routes: funcs::Routes,
    env: RwLock<Arc<Environment<'static>>>,
    pool: BufferPool,
}

/// Renders leaf templates into HTML responses. Cheap to clone.
#[derive(Clone)]
pub struct Renderer {
    inner: Arc<Inner>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer").field("config", &self.inner.config).finish_non_exhaustive()
    }
}

impl Renderer {
    pub fn builder(source: impl AssetSource) -> RendererBuilder {
        RendererBuilder {
            source: Arc::new(source),
            config: Config {
                base: vec![DEFAULT_BASE.to_owned()],
                templates: Vec::new(),
                funcs: Vec::new(),
                injections: Vec::new(),
                routes: FxHashMap::default(),
                reload: false,
            },
        }
    }

    /// Renders leaf template `name` with `data` into a `text/html` response with `status`.
    ///
    /// # Errors
    /// [`RenderError::UnknownTemplate`] if `name` was not added, otherwise reload and
    /// template errors.
    pub fn render<D: Serialize>(
        &self,
        parts: &Parts,
        name: &str,
        status: StatusCode,
        data: D,
    ) -> Result<Response, RenderError> {
        let start = Instant::now();
        let env = self.environment()?;
        let env = self.bind(&env, parts);
        let body = self.execute(&env, name, data)?;

        tracing::info!(template = name, status = status.as_u16(), took = ?start.elapsed(), "rendered");
        Ok((
            status,
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"))],
            body,
        )
            .into_response())
    }

    /// Renders leaf template `name` without a request. Injected functions are unavailable.
    ///
    /// # Errors
    /// As [`Renderer::render`].
    pub fn render_to_string<D: Serialize>(&self, name: &str, data: D) -> Result<String, RenderError> {
        let env = self.environment()?;
        let body = self.execute(&env, name, data)?;
        String::from_utf8(body.to_vec()).map_err(|e| RenderError::from(e.to_string()))
    }

    /// Re-parses all templates now and swaps them in.
    ///
    /// # Errors
    /// As [`RendererBuilder::build`]. The previous templates stay active on failure.
    pub fn reload_templates(&self) -> Result<(), RenderError> {
        let fresh = parse(&self.inner.config, &self.inner.routes, self.inner.source.as_ref())?;
        *self.inner.env.write() = Arc::new(fresh);
        tracing::debug!("templates reloaded");
        Ok(())
    }

    /// Leaf template names, in the order they were added.
    #[must_use]
    pub fn templates(&self) -> &[String] {
        &self.inner.config.templates
    }

    fn environment(&self) -> Result<Arc<Environment<'static>>, RenderError> {
        if self.inner.config.reload {
            self.reload_templates()?;
        }
        Ok(Arc::clone(&self.inner.env.read()))
    }

    fn bind<'a>(&self, env: &'a Environment<'static>, parts: &Parts) -> Cow<'a, Environment<'static>> {
        if self.inner.config.injections.is_empty() {
            return Cow::Borrowed(env);
        }

        let mut bound = env.clone();
        for (name, factory) in &self.inner.config.injections {
            bound.add_global(name.clone(), factory(parts));
        }
        Cow::Owned(bound)
    }

    fn execute<D: Serialize>(
        &self,
        env: &Environment<'static>,
        name: &str,
        data: D,
    ) -> Result<Bytes, RenderError> {
        if !self.inner.config.templates.iter().any(|t| t == name) {
            return Err(RenderError::UnknownTemplate { message: name.to_owned().into(), context: None });
        }
        let tmpl = env.get_template(name)?;

        let mut buf = self.inner.pool.get();
        let result = tmpl.render_to_write(data, &mut buf);
        let body = result.map(|_| Bytes::copy_from_slice(&buf));
        self.inner.pool.put(buf);
        body.context(format!("rendering {name}"))
    }
}

fn parse(
    config: &Config,
    routes: &funcs::Routes,
    source: &dyn AssetSource,
) -> Result<Environment<'static>, RenderError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    env.add_function("itoa", funcs::itoa);
    let routes = Arc::clone(routes);
    env.add_function("url_to", move |name: &str, params: Rest<Value>| {
        funcs::url_to(&routes, name, &params).map(Value::from_safe_string)
    });
    for (name, value) in &config.funcs {
        env.add_global(name.clone(), value.clone());
    }
    for (name, _) in &config.injections {
        env.add_function(name.clone(), funcs::placeholder(name.clone()));
    }

    for name in &config.base {
        let src = source.read(name)?;
        env.add_template_owned(name.clone(), src).context(format!("base template {name}"))?;
    }

    let layout = &config.base[0];
    for name in &config.templates {
        let src = source.read(name)?;
        env.add_template_owned(name.clone(), with_layout(layout, src))
            .context(format!("template {name}"))?;
    }
    Ok(env)
}

/// Makes `src` extend `layout` unless its first statement is an `extends` tag.
///
/// The tag goes on the first line so error line numbers match the file.
fn with_layout(layout: &str, src: String) -> String {
    if starts_with_extends(&src) { src } else { format!("{{% extends \"{layout}\" %}}{src}") }
}

/// Leading whitespace and `{# comments #}` are skipped.
fn starts_with_extends(src: &str) -> bool {
    let mut rest = src.trim_start();
    while let Some(comment) = rest.strip_prefix("{#") {
        let Some(end) = comment.find("#}") else {
            return false;
        };
        rest = comment[end + 2..].trim_start();
    }

    let Some(tag) = rest.strip_prefix("{%") else {
        return false;
    };
    let tag = tag.strip_prefix(['-', '+']).unwrap_or(tag).trim_start();
    tag.strip_prefix("extends").is_some_and(|after| after.starts_with(char::is_whitespace))
}

/// Logs `err` and answers with its text as `text/plain`.
pub fn plain_error(status: StatusCode, err: &impl fmt::Display) -> Response {
    tracing::error!(status = status.as_u16(), error = %err, "plain error");
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        format!("{err}\n"),
    )
        .into_response()
}
