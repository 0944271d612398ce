//! Controller/view naming conventions.
//!
//! A controller class name such as `Bookshelf::Controllers::Books::Index`
//! is matched against the controller pattern to capture the controller
//! (`Books`) and action (`Index`); the view pattern turns the captures back
//! into a name (`Bookshelf::Views::Books::Index`).

use crate::rendering::RenderError;

pub const CONTROLLER_PLACEHOLDER: &str = "%{controller}";
pub const ACTION_PLACEHOLDER: &str = "%{action}";

/// Name separator between namespace and class segments.
pub const SEPARATOR: &str = "::";

/// A pattern split around its two placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    source: String,
    head: String,
    middle: String,
    tail: String,
}

impl NamingPattern {
    pub fn parse(source: &str) -> Result<Self, RenderError> {
        let invalid = || RenderError::InvalidPattern {
            pattern: source.to_string(),
        };
        let (head, rest) = source.split_once(CONTROLLER_PLACEHOLDER).ok_or_else(invalid)?;
        let (middle, tail) = rest.split_once(ACTION_PLACEHOLDER).ok_or_else(invalid)?;
        if middle.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            source: source.to_string(),
            head: head.to_string(),
            middle: middle.to_string(),
            tail: tail.to_string(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Substitute both placeholders.
    pub fn format(&self, controller: &str, action: &str) -> String {
        format!("{}{}{}{}{}", self.head, controller, self.middle, action, self.tail)
    }

    /// Capture `(controller, action)` out of `name`.
    ///
    /// The action is the text after the last separator, so nested
    /// controllers (`Admin::Books`) are captured whole.
    pub fn captures<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = name.strip_prefix(self.head.as_str())?;
        let rest = rest.strip_suffix(self.tail.as_str())?;
        let (controller, action) = rest.rsplit_once(self.middle.as_str())?;
        (!controller.is_empty() && !action.is_empty()).then_some((controller, action))
    }
}

/// Paired controller and view patterns.
#[derive(Debug, Clone)]
pub struct ViewNaming {
    controller: NamingPattern,
    view: NamingPattern,
}

impl ViewNaming {
    pub fn new(controller_pattern: &str, view_pattern: &str) -> Result<Self, RenderError> {
        Ok(Self {
            controller: NamingPattern::parse(controller_pattern)?,
            view: NamingPattern::parse(view_pattern)?,
        })
    }

    pub fn from_config(config: &crate::config::RenderingConfig) -> Result<Self, RenderError> {
        Self::new(&config.controller_pattern, &config.view_pattern)
    }

    /// Conventional controller class name for an action key.
    ///
    /// `("Bookshelf", "admin.books", "index")` → `Bookshelf::Controllers::Admin::Books::Index`.
    pub fn controller_name(&self, namespace: &str, controller: &str, action: &str) -> String {
        let controller = controller
            .split(['.', '/'])
            .filter(|s| !s.is_empty())
            .map(camelize)
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        qualify(namespace, &self.controller.format(&controller, &camelize(action)))
    }

    /// View name derived from a controller class name.
    pub fn view_name(&self, namespace: &str, controller_class: &str) -> Result<String, RenderError> {
        let mismatch = || RenderError::NamingMismatch {
            name: controller_class.to_string(),
            pattern: qualify(namespace, self.controller.source()),
        };

        let relative = if namespace.is_empty() {
            controller_class
        } else {
            controller_class
                .strip_prefix(namespace)
                .and_then(|rest| rest.strip_prefix(SEPARATOR))
                .ok_or_else(mismatch)?
        };

        let (controller, action) = self.controller.captures(relative).ok_or_else(mismatch)?;
        Ok(qualify(namespace, &self.view.format(controller, action)))
    }
}

impl Default for ViewNaming {
    fn default() -> Self {
        let config = crate::config::RenderingConfig::default();
        // The default patterns always parse.
        Self::from_config(&config).unwrap_or_else(|_| unreachable!("default naming patterns are valid"))
    }
}

/// Derive the view name for `controller_class` with explicit patterns.
pub fn derive_view_name(
    controller_class: &str,
    namespace: &str,
    controller_pattern: &str,
    view_pattern: &str,
) -> Result<String, RenderError> {
    ViewNaming::new(controller_pattern, view_pattern)?.view_name(namespace, controller_class)
}

/// Prefix `name` with `namespace` unless it is already qualified.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() || name.starts_with(&format!("{namespace}{SEPARATOR}")) {
        name.to_string()
    } else {
        format!("{namespace}{SEPARATOR}{name}")
    }
}

/// `user_profiles` → `UserProfiles`.
pub fn camelize(word: &str) -> String {
    word.split(['_', '-'])
        .filter(|s| !s.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTROLLERS: &str = "Controllers::%{controller}::%{action}";
    const VIEWS: &str = "Views::%{controller}::%{action}";

    #[test]
    fn test_default_pattern_derivation() {
        let name = derive_view_name("Foo::Controllers::Bar::Baz", "Foo", CONTROLLERS, VIEWS).unwrap();
        assert_eq!(name, "Foo::Views::Bar::Baz");
    }

    #[test]
    fn test_nested_controller() {
        let name =
            derive_view_name("Foo::Controllers::Admin::Books::Index", "Foo", CONTROLLERS, VIEWS).unwrap();
        assert_eq!(name, "Foo::Views::Admin::Books::Index");
    }

    #[test]
    fn test_custom_patterns() {
        let name = derive_view_name(
            "Shop::Web::Orders::ShowAction",
            "Shop",
            "Web::%{controller}::%{action}Action",
            "Templates::%{controller}::%{action}View",
        )
        .unwrap();
        assert_eq!(name, "Shop::Templates::Orders::ShowView");
    }

    #[test]
    fn test_mismatch_is_an_error() {
        let err = derive_view_name("Foo::Actions::Bar::Baz", "Foo", CONTROLLERS, VIEWS).unwrap_err();
        assert!(matches!(err, RenderError::NamingMismatch { .. }));

        let err = derive_view_name("Other::Controllers::Bar::Baz", "Foo", CONTROLLERS, VIEWS).unwrap_err();
        assert!(err.to_string().contains("Other::Controllers::Bar::Baz"));
    }

    #[test]
    fn test_controller_name_from_key() {
        let naming = ViewNaming::default();
        assert_eq!(
            naming.controller_name("Bookshelf", "admin.user_profiles", "show"),
            "Bookshelf::Controllers::Admin::UserProfiles::Show"
        );
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(NamingPattern::parse("Views::%{controller}").is_err());
        assert!(NamingPattern::parse("Views::%{controller}%{action}").is_err());
    }

    #[test]
    fn test_camelize_and_qualify() {
        assert_eq!(camelize("books"), "Books");
        assert_eq!(camelize("user_profiles"), "UserProfiles");
        assert_eq!(qualify("Web", "Views::Home::Show"), "Web::Views::Home::Show");
        assert_eq!(qualify("Web", "Web::Views::Home::Show"), "Web::Views::Home::Show");
        assert_eq!(qualify("", "Views::Home::Show"), "Views::Home::Show");
    }
}
