use std::{borrow, cell::RefCell, hash::Hash, rc::Rc};

use indexmap::IndexMap;
use symreg_expr::{Expr, Signature, Value};
use symreg_unit::{Unit, UnitCatalog};

use crate::{
    compose::{Scope, adapt_callable, synthesize},
    config::Config,
    error::RegistryError,
    present::{self, Detail},
    signature::{Body, DeclarationInput, Definition, Key, ParsedDeclaration, parse},
    simulate::Simulation,
    wrapper::Implementation,
};

/// A registered function.
#[derive(Debug)]
pub struct Entry {
    signature: Signature,
    implementation: Implementation,
    expr: Option<Expr>,
}

impl Entry {
    pub(crate) const fn new(
        signature: Signature,
        implementation: Implementation,
        expr: Option<Expr>,
    ) -> Self {
        Self {
            signature,
            implementation,
            expr,
        }
    }

    /// The canonical signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The implementation.
    #[must_use]
    pub const fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// The symbolic definition, with registered functions substituted, if
    /// the entry was declared symbolically.
    #[must_use]
    pub const fn expr(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }
}

/// A registry of named functions.
///
/// Functions are declared symbolically (`g(x) = f(x) + x**2`) or
/// registered from native functions, and symbolic declarations may refer to
/// any function registered before them. Units declared on functions and
/// their arguments are checked and converted whenever functions are
/// composed.
///
/// Entries keep their insertion order. Reassigning a name replaces its
/// entry in place. Every operation that fails leaves the registry as it
/// was.
///
/// Cloning a registry is cheap: the clone shares the implementations and
/// the unit catalog.
#[derive(Debug, Clone)]
pub struct Registry {
    catalog: Rc<RefCell<UnitCatalog>>,
    config: Config,
    entries: IndexMap<String, Rc<Entry>>,
    signatures: IndexMap<Signature, Rc<Entry>>,
}

impl Registry {
    /// Creates an empty registry with a standard unit catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::new())
    }

    /// Creates an empty registry with a standard unit catalog and the
    /// given configuration.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self::with_catalog(Rc::new(RefCell::new(UnitCatalog::standard())), config)
    }

    /// Creates an empty registry that resolves units with `catalog`.
    ///
    /// Registries created from the same catalog see each other's custom
    /// units.
    #[must_use]
    pub fn with_catalog(catalog: Rc<RefCell<UnitCatalog>>, config: Config) -> Self {
        Self {
            catalog,
            config,
            entries: IndexMap::new(),
            signatures: IndexMap::new(),
        }
    }

    /// Creates a registry from a sequence of declarations, registered in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns the first error any declaration raises.
    pub fn from_declarations<I>(declarations: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<DeclarationInput>,
    {
        let mut registry = Self::new();
        for declaration in declarations {
            registry.register(declaration)?;
        }
        Ok(registry)
    }

    /// The unit catalog.
    #[must_use]
    pub fn catalog(&self) -> Rc<RefCell<UnitCatalog>> {
        Rc::clone(&self.catalog)
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> Config {
        self.config
    }

    /// Defines a custom unit as `scale` times `base` in the unit catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if `base` cannot be resolved or `scale` is not a
    /// finite non-zero number.
    pub fn define_unit(&self, name: &str, base: &str, scale: f64) -> Result<Unit, RegistryError> {
        Ok(self.catalog.borrow_mut().define_custom(name, base, scale)?)
    }

    /// Registers a declaration and returns the new implementation.
    ///
    /// A declaration for a name that is already registered replaces the
    /// old entry. Functions that were composed from the old entry keep
    /// calling it.
    ///
    /// # Errors
    ///
    /// Returns an error if the declaration cannot be parsed, is ambiguous,
    /// calls an unknown function or has incompatible units.
    pub fn register(
        &mut self,
        declaration: impl Into<DeclarationInput>,
    ) -> Result<Implementation, RegistryError> {
        let entry = self.build(declaration.into())?;
        let implementation = entry.implementation().clone();
        self.install(entry);
        Ok(implementation)
    }

    /// Registers `value` under `key`, which may carry argument and unit
    /// annotations such as `"rho(x[km])[kg/m^3]"`.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn assign(
        &mut self,
        key: impl Into<Key>,
        value: impl Into<Definition>,
    ) -> Result<Implementation, RegistryError> {
        self.register(DeclarationInput::keyed(key, value))
    }

    /// Registers a full declaration such as `"f(x[cm])[kg] = x**2"`.
    ///
    /// # Errors
    ///
    /// See [`Registry::register`].
    pub fn declare(&mut self, declaration: &str) -> Result<Implementation, RegistryError> {
        self.register(declaration)
    }

    fn build(&self, declaration: DeclarationInput) -> Result<Entry, RegistryError> {
        let ParsedDeclaration { head, body } = parse(declaration, self.config.parser)?;

        let catalog = self.catalog.borrow();
        let scope = Scope {
            entries: &self.entries,
            catalog: &catalog,
            config: self.config,
        };

        match body {
            Body::Expr(expr) => synthesize(&scope, &head, &expr),
            Body::Callable(implementation) => adapt_callable(&scope, &head, implementation),
        }
    }

    fn install(&mut self, entry: Entry) {
        let name = entry.signature().name().to_string();
        let entry = Rc::new(entry);

        match self.entries.insert(name.clone(), Rc::clone(&entry)) {
            Some(previous) => tracing::debug!(
                name = %name,
                previous = %previous.signature(),
                signature = %entry.signature(),
                "replaced entry"
            ),
            None => tracing::debug!(name = %name, signature = %entry.signature(), "installed entry"),
        }

        self.sync_signatures();
    }

    fn sync_signatures(&mut self) {
        self.signatures = self
            .entries
            .values()
            .map(|entry| (entry.signature().clone(), Rc::clone(entry)))
            .collect();
    }

    fn name_of(&self, key: &Key) -> Option<String> {
        key.name(self.config.parser)
    }

    /// The implementation registered under `key`.
    #[must_use]
    pub fn get(&self, key: impl Into<Key>) -> Option<Implementation> {
        self.entry(key).map(|entry| entry.implementation().clone())
    }

    /// The entry registered under `key`.
    #[must_use]
    pub fn entry(&self, key: impl Into<Key>) -> Option<&Entry> {
        let name = self.name_of(&key.into())?;
        self.entries.get(&name).map(Rc::as_ref)
    }

    /// Checks whether `key` names a registered function.
    #[must_use]
    pub fn contains(&self, key: impl Into<Key>) -> bool {
        self.entry(key).is_some()
    }

    /// Removes the function registered under `key` and returns its
    /// implementation. Functions composed from it keep working.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AttributeNotFound`] if nothing is
    /// registered under `key`.
    pub fn remove(&mut self, key: impl Into<Key>) -> Result<Implementation, RegistryError> {
        let key = key.into();
        let name = self.name_of(&key).unwrap_or_else(|| key.to_string());

        let entry = self
            .entries
            .shift_remove(&name)
            .ok_or(RegistryError::AttributeNotFound { name })?;
        self.signatures.shift_remove(entry.signature());
        tracing::debug!(signature = %entry.signature(), "removed entry");

        Ok(entry.implementation().clone())
    }

    /// The registered names, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The registered signatures, in registration order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.signatures.keys()
    }

    /// The entries, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values().map(Rc::as_ref)
    }

    /// The names and implementations, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Implementation)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), entry.implementation()))
    }

    /// The number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Evaluates a registered function with named arguments.
    ///
    /// `target` is either a key such as `"f"` or a declaration such as
    /// `"g = f**2"`. A declaration is built against the registered functions
    /// for this call only and is not registered. Arguments that are not given fall back
    /// to the parameter defaults.
    ///
    /// The result maps every parameter to the value it was called with and
    /// the function name to the result.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingAssignmentTarget`] if `target` is an
    /// expression that names no function, and an error if the function is
    /// not registered, the declaration fails, or evaluation fails.
    pub fn evaluate<K>(
        &self,
        target: &str,
        args: &IndexMap<K, Value>,
    ) -> Result<IndexMap<String, Value>, RegistryError>
    where
        K: borrow::Borrow<str> + Hash + Eq,
    {
        if target.contains('=') {
            let entry = self.build(DeclarationInput::from(target))?;
            return Self::evaluate_entry(&entry, args);
        }

        let name = self
            .name_of(&Key::from(target))
            .ok_or_else(|| RegistryError::MissingAssignmentTarget {
                input: target.to_string(),
            })?;
        let entry = self
            .entries
            .get(&name)
            .ok_or(RegistryError::AttributeNotFound { name })?;

        Self::evaluate_entry(entry, args)
    }

    fn evaluate_entry<K>(
        entry: &Entry,
        args: &IndexMap<K, Value>,
    ) -> Result<IndexMap<String, Value>, RegistryError>
    where
        K: borrow::Borrow<str> + Hash + Eq,
    {
        let implementation = entry.implementation();
        let values = implementation.bind_named(args)?;
        let output = implementation.call(&values)?;

        let mut result = implementation
            .params()
            .iter()
            .map(|param| param.name.to_string())
            .zip(values)
            .collect::<IndexMap<_, _>>();
        result.insert(entry.signature().name().to_string(), output);

        Ok(result)
    }

    /// Creates a registry holding every entry of this one plus the given
    /// declarations.
    ///
    /// # Errors
    ///
    /// Returns the first error any declaration raises.
    pub fn derive<I>(&self, declarations: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator,
        I::Item: Into<DeclarationInput>,
    {
        let mut derived = self.clone();
        for declaration in declarations {
            derived.register(declaration)?;
        }
        Ok(derived)
    }

    /// Steps a state forward with every function that has an `update`
    /// attribute naming the state key it produces, in registration order.
    #[must_use]
    pub fn simulate<S>(&self, initial: IndexMap<S, Value>, steps: usize) -> Simulation
    where
        S: Into<String>,
    {
        let updates = self
            .entries
            .values()
            .filter_map(|entry| {
                let implementation = entry.implementation();
                implementation
                    .update()
                    .map(|key| (key, implementation.clone()))
            })
            .collect();
        let initial = initial
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();

        Simulation::new(updates, initial, steps)
    }

    /// Renders every entry as a LaTeX `equation` environment.
    #[must_use]
    pub fn to_latex(&self) -> String {
        present::render_all_latex(self.entries())
    }

    /// Describes every entry.
    #[must_use]
    pub fn detail(&self) -> Detail {
        present::detail(self.entries())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Merges registries into one, suffixing every name with `_<registry
/// name>`, so `f` from the registry named `m1` becomes `f_m1`.
///
/// The merged registry shares the implementations of its sources and the
/// unit catalog and configuration of the first source.
///
/// # Errors
///
/// Returns [`RegistryError::AmbiguousSignature`] if two suffixed names
/// collide.
pub fn compose<'a, N>(
    registries: impl IntoIterator<Item = (N, &'a Registry)>,
) -> Result<Registry, RegistryError>
where
    N: AsRef<str>,
{
    let mut composed: Option<Registry> = None;

    for (suffix, registry) in registries {
        let suffix = suffix.as_ref();
        let target = composed.get_or_insert_with(|| {
            Registry::with_catalog(registry.catalog(), registry.config())
        });

        let renames = registry
            .keys()
            .map(|name| (name.to_string(), format!("{name}_{suffix}")))
            .collect::<IndexMap<_, _>>();

        for entry in registry.entries() {
            let name = format!("{}_{suffix}", entry.signature().name());
            if target.entries.contains_key(&name) {
                return Err(RegistryError::ambiguous(
                    name,
                    "the name is produced by more than one composed registry",
                ));
            }

            let renamed = Entry::new(
                entry.signature().renamed(name.clone()),
                entry.implementation().clone(),
                entry.expr().map(|expr| expr.rename_calls(&renames)),
            );
            target.entries.insert(name, Rc::new(renamed));
        }
    }

    let mut composed = composed.unwrap_or_default();
    composed.sync_signatures();
    tracing::debug!(entries = composed.len(), "composed registries");

    Ok(composed)
}
