//! Email addresses with optional display names, and recipient sets.

use crate::error::MailError;
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// An email address with an optional display name.
///
/// # Examples
///
/// ```
/// use mailkit::Address;
///
/// let addr: Address = "user@example.com".into();
/// assert_eq!(addr.email, "user@example.com");
/// assert_eq!(addr.name, None);
///
/// let addr: Address = ("Alice", "alice@example.com").into();
/// assert_eq!(addr.name, Some("Alice".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Optional display name (e.g., "Alice Smith")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address (e.g., "alice@example.com")
    pub email: String,
}

impl Address {
    /// Create a new address with just an email.
    ///
    /// Logs a warning if the email looks obviously invalid. For strict
    /// validation, use [`Address::parse`].
    pub fn new(email: impl Into<String>) -> Self {
        let email = email.into();

        if !Self::basic_sanity_check(&email) {
            tracing::warn!(
                email = %email,
                "Creating address with potentially invalid email. Use Address::parse() for strict validation."
            );
        }

        Self { name: None, email }
    }

    /// Create a new address with a name and email.
    ///
    /// An empty name is treated as no name.
    pub fn with_name(name: impl Into<String>, email: impl Into<String>) -> Self {
        let name = name.into();
        let mut addr = Self::new(email);
        if !name.is_empty() {
            addr.name = Some(name);
        }
        addr
    }

    fn basic_sanity_check(email: &str) -> bool {
        !email.is_empty() && email.contains('@')
    }

    /// Parse and validate an email address (RFC 5321/5322).
    ///
    /// ```
    /// use mailkit::Address;
    ///
    /// assert!(Address::parse("user@example.com").is_ok());
    /// assert!(Address::parse("not-an-email").is_err());
    /// ```
    pub fn parse(email: &str) -> Result<Self, MailError> {
        if !EmailAddress::is_valid(email) {
            return Err(MailError::InvalidAddress(format!(
                "'{}' is not a valid email address",
                email
            )));
        }

        Ok(Self {
            name: None,
            email: email.to_string(),
        })
    }

    /// The domain part of the address, if any.
    pub fn domain(&self) -> Option<&str> {
        self.email.rsplit_once('@').map(|(_, domain)| domain)
    }

    /// Convert the domain part of the address to ASCII (Punycode).
    ///
    /// ```
    /// use mailkit::Address;
    ///
    /// let addr = Address::new("user@例え.jp");
    /// assert_eq!(addr.to_ascii().unwrap(), "user@xn--r8jz45g.jp");
    /// ```
    pub fn to_ascii(&self) -> Result<String, MailError> {
        let (local_part, domain) = self.email.rsplit_once('@').ok_or_else(|| {
            MailError::InvalidAddress(format!("'{}' is missing @ symbol", self.email))
        })?;

        let ascii_domain = idna::domain_to_ascii(domain).map_err(|e| {
            MailError::InvalidAddress(format!(
                "Failed to convert domain '{}' to ASCII: {:?}",
                domain, e
            ))
        })?;

        Ok(format!("{}@{}", local_part, ascii_domain))
    }

    /// Format as "Name <email>" or just "email" if no name.
    pub fn formatted(&self) -> String {
        match &self.name {
            Some(name) => format!("{} <{}>", name, self.email),
            None => self.email.clone(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.formatted())
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

// (name, email)
impl From<(&str, &str)> for Address {
    fn from((name, email): (&str, &str)) -> Self {
        Self::with_name(name, email)
    }
}

impl From<(String, String)> for Address {
    fn from((name, email): (String, String)) -> Self {
        Self::with_name(name, email)
    }
}

/// Trait for types that can be converted to an email address.
///
/// ```rust
/// use mailkit::{Address, ToAddress};
///
/// struct User {
///     name: String,
///     email: String,
/// }
///
/// impl ToAddress for User {
///     fn to_address(&self) -> Address {
///         Address::with_name(&self.name, &self.email)
///     }
/// }
/// ```
pub trait ToAddress {
    fn to_address(&self) -> Address;
}

impl<T: ToAddress + ?Sized> ToAddress for &T {
    fn to_address(&self) -> Address {
        (*self).to_address()
    }
}

impl ToAddress for Address {
    fn to_address(&self) -> Address {
        self.clone()
    }
}

impl ToAddress for str {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

impl ToAddress for String {
    fn to_address(&self) -> Address {
        Address::new(self)
    }
}

impl<N: AsRef<str>, E: AsRef<str>> ToAddress for (N, E) {
    fn to_address(&self) -> Address {
        Address::with_name(self.0.as_ref(), self.1.as_ref())
    }
}

/// A set of recipients, as accepted by [`Mailer::set_to`](crate::Mailer::set_to).
///
/// Built from a single address, a positional list of addresses (no display
/// names), an array of `(name, email)` pairs, or a mapping of address to
/// display name.
///
/// ```
/// use mailkit::Recipients;
/// use std::collections::BTreeMap;
///
/// let one: Recipients = "a@example.com".into();
/// assert_eq!(one.len(), 1);
///
/// let mut named = BTreeMap::new();
/// named.insert("a@example.com", "Alice");
/// named.insert("b@example.com", "Bob");
/// let named: Recipients = named.into();
/// assert_eq!(named.addresses()[1].name.as_deref(), Some("Bob"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecipientsRepr", into = "Vec<Address>")]
pub struct Recipients(Vec<Address>);

impl Recipients {
    /// The recipients in insertion order.
    pub fn addresses(&self) -> &[Address] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Address> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first recipient, if any.
    pub fn first(&self) -> Option<&Address> {
        self.0.first()
    }
}

impl From<Recipients> for Vec<Address> {
    fn from(recipients: Recipients) -> Self {
        recipients.0
    }
}

impl From<Address> for Recipients {
    fn from(addr: Address) -> Self {
        Self(vec![addr])
    }
}

impl From<&str> for Recipients {
    fn from(email: &str) -> Self {
        Self(vec![Address::new(email)])
    }
}

impl From<String> for Recipients {
    fn from(email: String) -> Self {
        Self(vec![Address::new(email)])
    }
}

impl From<Vec<Address>> for Recipients {
    fn from(addrs: Vec<Address>) -> Self {
        Self(addrs)
    }
}

impl From<Vec<&str>> for Recipients {
    fn from(emails: Vec<&str>) -> Self {
        Self(emails.into_iter().map(Address::new).collect())
    }
}

impl From<Vec<String>> for Recipients {
    fn from(emails: Vec<String>) -> Self {
        Self(emails.into_iter().map(Address::new).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Recipients {
    fn from(emails: [&str; N]) -> Self {
        Self(emails.into_iter().map(Address::new).collect())
    }
}

// (name, email), the same order as `Address::from` and `ToAddress`.
impl<const N: usize> From<[(&str, &str); N]> for Recipients {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(pairs.into_iter().map(Address::from).collect())
    }
}

impl<E: AsRef<str>, N: AsRef<str>> From<BTreeMap<E, N>> for Recipients {
    fn from(map: BTreeMap<E, N>) -> Self {
        Self(
            map.iter()
                .map(|(email, name)| Address::with_name(name.as_ref(), email.as_ref()))
                .collect(),
        )
    }
}

impl<E: AsRef<str>, N: AsRef<str>> From<HashMap<E, N>> for Recipients {
    fn from(map: HashMap<E, N>) -> Self {
        Self(
            map.iter()
                .map(|(email, name)| Address::with_name(name.as_ref(), email.as_ref()))
                .collect(),
        )
    }
}

/// Accepted serialized forms: `"a@x"`, `["a@x", ...]`, `{"a@x": "Name"}`,
/// or a list of `{name, email}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecipientsRepr {
    One(String),
    Named(BTreeMap<String, String>),
    List(Vec<AddressRepr>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Bare(String),
    Full(Address),
}

impl From<RecipientsRepr> for Recipients {
    fn from(repr: RecipientsRepr) -> Self {
        match repr {
            RecipientsRepr::One(email) => email.into(),
            RecipientsRepr::Named(map) => map.into(),
            RecipientsRepr::List(items) => Self(
                items
                    .into_iter()
                    .map(|item| match item {
                        AddressRepr::Bare(email) => Address::new(email),
                        AddressRepr::Full(addr) => addr,
                    })
                    .collect(),
            ),
        }
    }
}
