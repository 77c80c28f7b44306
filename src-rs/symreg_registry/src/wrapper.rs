//! Implementations: native functions carrying unit and presentation
//! metadata.
//!
//! An [`Implementation`] is a shared handle. Cloning it yields another
//! handle to the same function and the same metadata, so attribute changes
//! made through one handle are seen through every other handle, including
//! the one held by a registry.

use std::{borrow, cell::RefCell, fmt, hash::Hash, rc::Rc};

use indexmap::IndexMap;
use symreg_expr::{EvalError, Signature, Symbol, Value, lambda_to_latex, signature_to_latex};

use crate::util::strip_math_delimiters;

/// The native function behind an implementation.
///
/// It always receives exactly one value per parameter, in parameter order.
pub type NativeFunction = dyn Fn(&[Value]) -> Result<Value, EvalError>;

/// A named parameter with an optional default value.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// The parameter name
    pub name: Symbol,
    /// The value used when the caller supplies none
    pub default: Option<Value>,
}

impl Param {
    /// Creates a parameter without a default.
    #[must_use]
    pub fn new(name: impl Into<Symbol>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// Creates a parameter with a default value.
    #[must_use]
    pub fn with_default(name: impl Into<Symbol>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }
}

/// A free-form attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Text, such as a citation or the name of a state key
    Text(String),
    /// A numeric value
    Value(Value),
    /// The shape of a gridded result
    Shape(Vec<usize>),
}

impl AttrValue {
    /// Returns the text, if this is a text attribute.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Value(_) | Self::Shape(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Value(value) => write!(f, "{value}"),
            Self::Shape(shape) => {
                let dims = shape
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({dims})")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        Self::Value(Value::Scalar(value))
    }
}

/// The metadata attached to an implementation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    /// The unit of the result, empty when the result has no declared unit
    pub units: String,
    /// The unit expected for each argument
    pub arg_units: IndexMap<Symbol, String>,
    /// A display equation, such as `$f(x) = x^2$`
    pub equation: Option<String>,
    /// The result of calling the function with its sample arguments
    pub data: Option<Value>,
    /// Any other attributes, such as `citation` or `update`
    pub attrs: IndexMap<String, AttrValue>,
}

struct Inner {
    name: String,
    params: Vec<Param>,
    function: Rc<NativeFunction>,
    meta: RefCell<Meta>,
}

/// A callable value with attached metadata.
#[derive(Clone)]
pub struct Implementation(Rc<Inner>);

impl Implementation {
    fn from_parts(
        name: String,
        params: Vec<Param>,
        function: Rc<NativeFunction>,
        meta: Meta,
    ) -> Self {
        Self(Rc::new(Inner {
            name,
            params,
            function,
            meta: RefCell::new(meta),
        }))
    }

    /// The name of the underlying function.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The parameters, in calling order.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.0.params
    }

    /// The parameter names, in calling order.
    #[must_use]
    pub fn arg_names(&self) -> Vec<Symbol> {
        self.0.params.iter().map(|param| param.name.clone()).collect()
    }

    /// The signature implied by the function name and its parameters.
    #[must_use]
    pub fn signature(&self) -> Signature {
        Signature::new(self.0.name.clone(), self.arg_names())
    }

    /// Checks whether a call with `arity` positional arguments can be
    /// completed from the parameter defaults.
    #[must_use]
    pub fn accepts(&self, arity: usize) -> bool {
        self.0
            .params
            .get(arity..)
            .is_some_and(|rest| rest.iter().all(|param| param.default.is_some()))
    }

    /// Calls the function with positional arguments.
    ///
    /// Trailing parameters that receive no argument take their default.
    ///
    /// # Errors
    ///
    /// Returns an error if too many arguments are supplied, if a parameter
    /// without a default receives no argument, or if the function fails.
    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        let params = &self.0.params;
        if args.len() > params.len() {
            return Err(EvalError::ArgumentCount {
                name: self.0.name.clone(),
                expected: params.len(),
                found: args.len(),
            });
        }

        let values = params
            .iter()
            .enumerate()
            .map(|(index, param)| self.argument(param, args.get(index)))
            .collect::<Result<Vec<_>, _>>()?;

        (self.0.function)(&values)
    }

    /// Resolves the value of every parameter from named arguments, falling
    /// back to defaults. Arguments that name no parameter are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter without a default has no argument.
    pub fn bind_named<K>(&self, args: &IndexMap<K, Value>) -> Result<Vec<Value>, EvalError>
    where
        K: borrow::Borrow<str> + Hash + Eq,
    {
        self.0
            .params
            .iter()
            .map(|param| self.argument(param, args.get(param.name.name())))
            .collect()
    }

    /// Calls the function with named arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if a parameter without a default has no argument
    /// or if the function fails.
    pub fn call_named<K>(&self, args: &IndexMap<K, Value>) -> Result<Value, EvalError>
    where
        K: borrow::Borrow<str> + Hash + Eq,
    {
        let values = self.bind_named(args)?;
        (self.0.function)(&values)
    }

    fn argument(&self, param: &Param, supplied: Option<&Value>) -> Result<Value, EvalError> {
        supplied
            .or(param.default.as_ref())
            .cloned()
            .ok_or_else(|| EvalError::MissingArgument {
                name: self.0.name.clone(),
                param: param.name.to_string(),
            })
    }

    /// A snapshot of the metadata.
    #[must_use]
    pub fn meta(&self) -> Meta {
        self.0.meta.borrow().clone()
    }

    /// The unit of the result, empty when none is declared.
    #[must_use]
    pub fn units(&self) -> String {
        self.0.meta.borrow().units.clone()
    }

    /// The unit expected for each argument.
    #[must_use]
    pub fn arg_units(&self) -> IndexMap<Symbol, String> {
        self.0.meta.borrow().arg_units.clone()
    }

    /// The sample data, if any was produced.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        self.0.meta.borrow().data.clone()
    }

    /// Reads a free-form attribute.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<AttrValue> {
        self.0.meta.borrow().attrs.get(key).cloned()
    }

    /// Sets a free-form attribute, visible through every handle.
    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.0
            .meta
            .borrow_mut()
            .attrs
            .insert(key.into(), value.into());
    }

    /// The state key this function updates during a simulation.
    #[must_use]
    pub fn update(&self) -> Option<String> {
        self.attr("update")
            .and_then(|value| value.as_text().map(ToString::to_string))
    }

    /// Checks whether two handles refer to the same implementation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Renders the implementation as LaTeX.
    ///
    /// This is the equation with its `$` delimiters removed or, when no
    /// equation is attached, `$f{\left(x \right)} = \lambda{\left(x \right)}$`.
    #[must_use]
    pub fn repr_latex(&self) -> String {
        let meta = self.0.meta.borrow();
        match &meta.equation {
            Some(equation) => strip_math_delimiters(equation).to_string(),
            None => format!(
                "${} = {}$",
                signature_to_latex(&self.signature()),
                lambda_to_latex(&self.arg_names())
            ),
        }
    }

    /// Creates an implementation with the same name and metadata but a
    /// different function. The sample data is dropped.
    pub(crate) fn with_function(&self, params: Vec<Param>, function: Rc<NativeFunction>) -> Self {
        let mut meta = self.meta();
        meta.data = None;
        Self::from_parts(self.0.name.clone(), params, function, meta)
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("name", &self.0.name)
            .field("params", &self.0.params)
            .field("meta", &self.0.meta.borrow())
            .finish_non_exhaustive()
    }
}

impl From<Callable> for Implementation {
    fn from(callable: Callable) -> Self {
        wrap(callable, WrapOptions::new())
    }
}

/// A native function together with its parameter list.
///
/// ```ignore
/// let f = Callable::new("f", |args| args[0].checked_add(&args[1]))
///     .arg("x")
///     .arg_with_default("y", 3.0);
/// ```
pub struct Callable {
    name: String,
    params: Vec<Param>,
    function: Rc<NativeFunction>,
}

impl Callable {
    /// Creates a callable with no parameters.
    pub fn new<F>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            function: Rc::new(function),
        }
    }

    /// Appends a parameter without a default.
    #[must_use]
    pub fn arg(mut self, name: impl Into<Symbol>) -> Self {
        self.params.push(Param::new(name));
        self
    }

    /// Appends a parameter with a default value.
    #[must_use]
    pub fn arg_with_default(mut self, name: impl Into<Symbol>, default: impl Into<Value>) -> Self {
        self.params.push(Param::with_default(name, default));
        self
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Something [`wrap`] can attach metadata to.
#[derive(Debug)]
pub enum Wrappable {
    /// A bare callable with empty metadata
    Callable(Callable),
    /// An implementation whose metadata is extended
    Implementation(Implementation),
}

impl From<Callable> for Wrappable {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable)
    }
}

impl From<Implementation> for Wrappable {
    fn from(implementation: Implementation) -> Self {
        Self::Implementation(implementation)
    }
}

impl From<&Implementation> for Wrappable {
    fn from(implementation: &Implementation) -> Self {
        Self::Implementation(implementation.clone())
    }
}

/// The metadata [`wrap`] attaches.
///
/// Unset options leave the existing metadata of the wrapped function alone.
#[derive(Debug, Clone, Default)]
pub struct WrapOptions {
    units: Option<String>,
    arg_units: IndexMap<Symbol, String>,
    equation: Option<String>,
    data: Option<Value>,
    attrs: IndexMap<String, AttrValue>,
    sample_args: IndexMap<Symbol, Value>,
    skip_sample_data: bool,
}

impl WrapOptions {
    /// Creates options that change nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the unit of the result.
    #[must_use]
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Sets the unit of one argument.
    #[must_use]
    pub fn arg_unit(mut self, arg: impl Into<Symbol>, units: impl Into<String>) -> Self {
        self.arg_units.insert(arg.into(), units.into());
        self
    }

    /// Sets the display equation.
    #[must_use]
    pub fn equation(mut self, equation: impl Into<String>) -> Self {
        self.equation = Some(equation.into());
        self
    }

    /// Sets the sample data directly instead of computing it.
    #[must_use]
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Sets a free-form attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Sets the value of one argument used to compute the sample data,
    /// overriding its default.
    #[must_use]
    pub fn sample_arg(mut self, arg: impl Into<Symbol>, value: impl Into<Value>) -> Self {
        self.sample_args.insert(arg.into(), value.into());
        self
    }

    /// Leaves the sample data empty instead of calling the function.
    #[must_use]
    pub fn without_sample_data(mut self) -> Self {
        self.skip_sample_data = true;
        self
    }
}

/// Attaches metadata to a function without changing how it is called.
///
/// Wrapping an existing implementation yields a new implementation that
/// shares its function and starts from a copy of its metadata; the options
/// given here take precedence. Because of that, the metadata of a chain of
/// wraps is the metadata of the last one applied.
///
/// Unless the data is given explicitly, the function is called once with
/// its sample arguments and defaults to populate [`Meta::data`]. If some
/// parameter has no value, or the call fails, the data stays empty.
#[must_use]
pub fn wrap(source: impl Into<Wrappable>, options: WrapOptions) -> Implementation {
    let (name, params, function, mut meta) = match source.into() {
        Wrappable::Callable(callable) => (
            callable.name,
            callable.params,
            callable.function,
            Meta::default(),
        ),
        Wrappable::Implementation(implementation) => (
            implementation.0.name.clone(),
            implementation.0.params.clone(),
            Rc::clone(&implementation.0.function),
            implementation.meta(),
        ),
    };

    let WrapOptions {
        units,
        arg_units,
        equation,
        data,
        attrs,
        sample_args,
        skip_sample_data,
    } = options;

    if let Some(units) = units {
        meta.units = units;
    }
    meta.arg_units.extend(arg_units);
    if let Some(equation) = equation {
        meta.equation = Some(equation);
    }
    meta.attrs.extend(attrs);

    if let Some(data) = data {
        meta.data = Some(data);
    } else if !skip_sample_data && (meta.data.is_none() || !sample_args.is_empty()) {
        meta.data = sample_data(&name, &params, function.as_ref(), &sample_args);
    }

    Implementation::from_parts(name, params, function, meta)
}

fn sample_data(
    name: &str,
    params: &[Param],
    function: &NativeFunction,
    sample_args: &IndexMap<Symbol, Value>,
) -> Option<Value> {
    let values = params
        .iter()
        .map(|param| sample_args.get(&param.name).or(param.default.as_ref()).cloned())
        .collect::<Option<Vec<_>>>()?;

    match function(&values) {
        Ok(data) => Some(data),
        Err(error) => {
            tracing::debug!(name, %error, "could not populate sample data");
            None
        }
    }
}

/// Turns a function of a list of points into a function over named axes.
///
/// Calling the result with one array per axis evaluates `function` on every
/// point of the grid spanned by the axes, first axis outermost, and returns
/// the flattened results. Each axis defaults to the samples given here, and
/// the `shape` attribute records the shape of that default grid.
#[must_use]
pub fn gridify<F>(name: impl Into<String>, axes: IndexMap<Symbol, Vec<f64>>, function: F) -> Implementation
where
    F: Fn(&[Vec<f64>]) -> Result<Vec<f64>, EvalError> + 'static,
{
    let shape: Vec<usize> = axes.values().map(Vec::len).collect();
    let params = axes
        .into_iter()
        .map(|(axis, samples)| Param::with_default(axis, samples))
        .collect();

    let grid = move |values: &[Value]| -> Result<Value, EvalError> {
        let points = meshgrid(values);
        let result = function(&points)?;
        if result.len() != points.len() {
            return Err(EvalError::ShapeMismatch {
                left: points.len(),
                right: result.len(),
            });
        }
        Ok(Value::Array(result))
    };

    let callable = Callable {
        name: name.into(),
        params,
        function: Rc::new(grid),
    };

    wrap(callable, WrapOptions::new().attr("shape", AttrValue::Shape(shape)))
}

fn meshgrid(axes: &[Value]) -> Vec<Vec<f64>> {
    let mut points = vec![Vec::with_capacity(axes.len())];

    for axis in axes.iter().map(Value::to_vec) {
        points = points
            .into_iter()
            .flat_map(|point| {
                axis.iter().map(move |value| {
                    let mut point = point.clone();
                    point.push(*value);
                    point
                })
            })
            .collect();
    }

    points
}
