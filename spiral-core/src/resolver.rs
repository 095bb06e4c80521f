//! Argument resolution and validation
//!
//! Given a signature and caller-supplied arguments, [`ArgumentResolver`]
//! produces the final ordered argument list, pulling missing class-typed
//! values from a [`ServiceProvider`].
//!
//! Per parameter, in declaration order, the first source that applies wins:
//!
//! 1. a named argument with the parameter's name
//! 2. for variadic parameters, the sweep of remaining positional values
//! 3. a positional value (matched by instance for object-like types)
//! 4. the provider, for each class member of the declared type
//! 5. the default value
//! 6. `null` for nullable types
//!
//! Positional values are consumed in ascending key order, never in the order
//! they were inserted.

use std::collections::VecDeque;
use tracing::trace;

use crate::error::{DiError, DiResult, ErrorKind};
use crate::provider::ServiceProvider;
use crate::types::{Parameter, Signature, Type};
use crate::value::{Arguments, Key, Value};

pub struct ArgumentResolver<'a> {
    provider: &'a dyn ServiceProvider,
}

impl<'a> ArgumentResolver<'a> {
    pub fn new(provider: &'a dyn ServiceProvider) -> Self {
        Self { provider }
    }

    /// Resolve `arguments` against `signature`.
    ///
    /// With `validate` set, leftover named arguments are rejected and the
    /// result is checked with [`ArgumentResolver::validate`].
    pub fn resolve(
        &self,
        function: &str,
        signature: &Signature,
        arguments: Arguments,
        validate: bool,
    ) -> DiResult<Arguments> {
        trace!(
            "Resolving {} parameter(s) of `{}` from {} argument(s)",
            signature.len(),
            function,
            arguments.len()
        );

        let mut state = ResolvingState::new(arguments);
        for parameter in signature.iter() {
            self.resolve_parameter(function, parameter, &mut state, validate)?;
        }

        // a variadic only absorbs the named values its type accepts
        if validate {
            if let Some((name, _)) = state.named.first() {
                return Err(DiError::UnknownParameter {
                    function: function.to_string(),
                    parameter: name.clone(),
                });
            }
        }

        let mut result = state.finish(!signature.has_variadic());

        for value in result.values_mut() {
            if let Value::Autowire(autowire) = value {
                *value = autowire.resolve(self.provider, Arguments::new())?;
            }
        }

        if validate {
            Self::validate(function, signature, &result)?;
        }

        Ok(result)
    }

    fn resolve_parameter(
        &self,
        function: &str,
        parameter: &Parameter,
        state: &mut ResolvingState,
        validate: bool,
    ) -> DiResult<()> {
        let ty = parameter.ty.element();

        if parameter.is_variadic() {
            match state.take_named(&parameter.name) {
                Some(Value::Array(array)) => {
                    for (key, value) in array {
                        match key {
                            Key::Index(_) => state.add(parameter, value),
                            Key::Name(name) => state.add_trailing(parameter, name, value),
                        }
                    }
                }
                Some(value) => state.add(parameter, value),
                None => state.sweep_positional(parameter, ty),
            }
            state.sweep_named(parameter, ty);
            return Ok(());
        }

        if let Some(value) = state.take_named(&parameter.name) {
            state.add(parameter, value);
            return Ok(());
        }

        let positional = if validate && ty.is_object_like() {
            state.take_first_matching(ty)
        } else {
            state.take_first()
        };
        if let Some(value) = positional {
            state.add(parameter, value);
            return Ok(());
        }

        let mut error = None;
        match strip_nullable(ty) {
            Type::Intersection(members) => {
                if let Some(value) = self.resolve_intersection(parameter, members)? {
                    state.add(parameter, value);
                    return Ok(());
                }
            }
            _ => {
                for class in ty.class_names() {
                    match self.provider.get(class, Some(&parameter.name)) {
                        Ok(value) => {
                            state.add(parameter, value);
                            return Ok(());
                        }
                        Err(err) if err.kind() == ErrorKind::NotFound => {
                            trace!("`{}` not found for `${}`", class, parameter.name);
                            error = Some(err);
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        if let Some(default) = &parameter.default {
            state.add(parameter, default.clone());
            return Ok(());
        }

        if parameter.has_type() && parameter.allows_null() {
            state.add(parameter, Value::Null);
            return Ok(());
        }

        Err(error.unwrap_or_else(|| DiError::MissingRequiredArgument {
            function: function.to_string(),
            parameter: parameter.name.clone(),
        }))
    }

    /// Resolve an intersection through the one binding whose instance
    /// satisfies every member
    fn resolve_intersection(
        &self,
        parameter: &Parameter,
        members: &[Type],
    ) -> DiResult<Option<Value>> {
        let mut candidates = Vec::new();
        for member in members {
            let name = match member {
                Type::Class(name) if self.provider.has(name) => name,
                _ => continue,
            };
            match self.provider.get(name, Some(&parameter.name)) {
                Ok(value) if members.iter().all(|m| m.accepts(&value)) => candidates.push(value),
                Ok(_) => trace!(
                    "`{}` does not satisfy the intersection of `${}`",
                    name,
                    parameter.name
                ),
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => return Err(err),
            }
        }

        if candidates.len() == 1 {
            Ok(candidates.pop())
        } else {
            Ok(None)
        }
    }

    /// Check an already resolved argument list against the signature
    pub fn validate(function: &str, signature: &Signature, arguments: &Arguments) -> DiResult<()> {
        let parameters = signature.parameters();
        if parameters.is_empty() {
            return Ok(());
        }

        let mut entries: VecDeque<(Key, Value)> = arguments.clone().into_iter().collect();
        let mut remaining = parameters.iter();
        let mut positional = true;
        let mut parameter: Option<&Parameter> = None;
        let mut variadic = false;

        while remaining.len() > 0 || !entries.is_empty() {
            let key = entries.front().map(|(key, _)| key.clone());

            if let Some(Key::Index(index)) = key {
                if !positional {
                    return Err(DiError::PositionalArgument {
                        function: function.to_string(),
                        parameter: format!("#{}", index),
                    });
                }
            }
            positional = positional && matches!(key, Some(Key::Index(_)));

            if !variadic {
                parameter = remaining.next();
                variadic = parameter.map_or(false, Parameter::is_variadic);
            }

            let parameter = match parameter {
                Some(parameter) => parameter,
                None => match key {
                    Some(Key::Name(name)) => {
                        return Err(DiError::UnknownParameter {
                            function: function.to_string(),
                            parameter: name,
                        })
                    }
                    // extra positional values are ignored by the callee
                    _ => {
                        entries.pop_front();
                        continue;
                    }
                },
            };

            let value = if positional || variadic {
                match entries.pop_front() {
                    Some((_, value)) => value,
                    None => break,
                }
            } else {
                let slot = Key::Name(parameter.name.clone());
                match entries.iter().position(|(key, _)| *key == slot) {
                    Some(at) => entries
                        .remove(at)
                        .map(|(_, value)| value)
                        .unwrap_or_default(),
                    None if parameter.is_optional() => continue,
                    None => {
                        return Err(DiError::MissingRequiredArgument {
                            function: function.to_string(),
                            parameter: parameter.name.clone(),
                        })
                    }
                }
            };

            if !parameter.has_type() || (parameter.allows_null() && value.is_null()) {
                continue;
            }

            if !parameter.ty.element().accepts(&value) {
                return Err(DiError::InvalidArgumentType {
                    function: function.to_string(),
                    parameter: parameter.name.clone(),
                });
            }
        }

        Ok(())
    }
}

fn strip_nullable(ty: &Type) -> &Type {
    match ty {
        Type::Nullable(inner) => inner,
        other => other,
    }
}

/// Argument pools and the output being built
struct ResolvingState {
    /// Unconsumed positional values, ascending by key
    positional: Vec<(usize, Value)>,
    /// Unconsumed named values, in caller order
    named: Vec<(String, Value)>,
    resolved: Arguments,
    trailing: Vec<(String, Value)>,
}

impl ResolvingState {
    fn new(arguments: Arguments) -> Self {
        let mut positional = Vec::new();
        let mut named = Vec::new();
        for (key, value) in arguments {
            match key {
                Key::Index(index) => positional.push((index, value)),
                Key::Name(name) => named.push((name, value)),
            }
        }
        positional.sort_by_key(|(index, _)| *index);

        Self {
            positional,
            named,
            resolved: Arguments::new(),
            trailing: Vec::new(),
        }
    }

    fn take_named(&mut self, name: &str) -> Option<Value> {
        let at = self.named.iter().position(|(n, _)| n == name)?;
        Some(self.named.remove(at).1)
    }

    fn take_first(&mut self) -> Option<Value> {
        if self.positional.is_empty() {
            None
        } else {
            Some(self.positional.remove(0).1)
        }
    }

    fn take_first_matching(&mut self, ty: &Type) -> Option<Value> {
        let at = self.positional.iter().position(|(_, v)| ty.accepts(v))?;
        Some(self.positional.remove(at).1)
    }

    fn sweep_positional(&mut self, parameter: &Parameter, ty: &Type) {
        let pool = std::mem::take(&mut self.positional);

        if ty.is_unconstrained() {
            for (_, value) in pool {
                self.add(parameter, value);
            }
            return;
        }

        for (index, value) in pool {
            if ty.accepts(&value) {
                self.add(parameter, value);
                continue;
            }
            match value {
                Value::Array(array) if !array.is_empty() && array.values().all(|v| ty.accepts(v)) => {
                    for (key, item) in array {
                        match key {
                            Key::Index(_) => self.add(parameter, item),
                            Key::Name(name) => self.add_trailing(parameter, name, item),
                        }
                    }
                }
                other => self.positional.push((index, other)),
            }
        }
    }

    fn sweep_named(&mut self, parameter: &Parameter, ty: &Type) {
        let pool = std::mem::take(&mut self.named);
        for (name, value) in pool {
            if ty.is_unconstrained() || ty.accepts(&value) {
                self.add_trailing(parameter, name, value);
            } else {
                self.named.push((name, value));
            }
        }
    }

    fn add(&mut self, parameter: &Parameter, value: Value) {
        self.resolved.push(pass(parameter, value));
    }

    fn add_trailing(&mut self, parameter: &Parameter, name: String, value: Value) {
        self.trailing.push((name, pass(parameter, value)));
    }

    fn finish(self, append_leftovers: bool) -> Arguments {
        let mut resolved = self.resolved;
        if append_leftovers {
            for (_, value) in self.positional {
                resolved.push(value);
            }
        }
        for (name, value) in self.trailing {
            resolved.insert(name, value);
        }
        resolved
    }
}

/// References reach only by-reference parameters; everything else gets the value
fn pass(parameter: &Parameter, value: Value) -> Value {
    match value {
        Value::Reference(reference) if !parameter.by_reference => reference.get(),
        other => other,
    }
}
