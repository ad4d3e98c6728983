// Destination addresses: raw 20 bytes or a registry index.
//
// The registry is an append-only arena of addresses. Index `i` is the
// `i`-th distinct address ever registered. The decoding environment owns
// the authoritative copy; encoders work on a snapshot they were handed.
//
// Which form an action uses is carried out-of-band in the bit-stack
// (true = reference, false = raw).

use std::collections::HashMap;

use alloy_primitives::Address;

use super::vlq;

/// Length of a raw address field.
pub const ADDRESS_LEN: usize = 20;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Append-only address registry: a sequence plus a reverse index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressRegistry {
    entries: Vec<Address>,
    index: HashMap<Address, usize>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address`, returning its index. Idempotent: a known address
    /// keeps its existing index and nothing is appended.
    pub fn register(&mut self, address: Address) -> usize {
        if let Some(&i) = self.index.get(&address) {
            return i;
        }
        let i = self.entries.len();
        self.entries.push(address);
        self.index.insert(address, i);
        i
    }

    /// Address at `index`, if registered.
    #[inline]
    pub fn lookup(&self, index: usize) -> Option<Address> {
        self.entries.get(index).copied()
    }

    /// Index of `address`, if registered.
    #[inline]
    pub fn index_of(&self, address: &Address) -> Option<usize> {
        self.index.get(address).copied()
    }

    /// True when `lookup(index) == Some(address)`.
    #[inline]
    pub fn confirms(&self, index: usize, address: &Address) -> bool {
        self.entries.get(index) == Some(address)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry at or past `len`. Used to undo the registrations of
    /// a decode that failed part-way.
    pub(crate) fn truncate(&mut self, len: usize) {
        for address in self.entries.drain(len.min(self.entries.len())..) {
            self.index.remove(&address);
        }
    }

    /// Entries in registration order.
    pub fn entries(&self) -> &[Address] {
        &self.entries
    }
}

impl FromIterator<Address> for AddressRegistry {
    fn from_iter<I: IntoIterator<Item = Address>>(iter: I) -> Self {
        let mut registry = Self::new();
        for address in iter {
            registry.register(address);
        }
        registry
    }
}

// ---------------------------------------------------------------------------
// Resolution strategies
// ---------------------------------------------------------------------------

/// Maps a destination to a registry index the encoder may reference.
///
/// A resolver only proposes; the encoder still checks every proposal
/// against its snapshot before emitting a reference.
pub trait AddressResolver {
    fn resolve(&self, address: &Address, registry: &AddressRegistry) -> Option<usize>;
}

/// Never resolves. Every destination is sent raw.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolution;

impl AddressResolver for NoResolution {
    fn resolve(&self, _address: &Address, _registry: &AddressRegistry) -> Option<usize> {
        None
    }
}

/// Resolves through the snapshot's reverse index.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistryResolution;

impl AddressResolver for RegistryResolution {
    fn resolve(&self, address: &Address, registry: &AddressRegistry) -> Option<usize> {
        registry.index_of(address)
    }
}

impl<F> AddressResolver for F
where
    F: Fn(&Address, &AddressRegistry) -> Option<usize>,
{
    fn resolve(&self, address: &Address, registry: &AddressRegistry) -> Option<usize> {
        self(address, registry)
    }
}

// ---------------------------------------------------------------------------
// Field encoding
// ---------------------------------------------------------------------------

/// The address field of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressField {
    Raw(Address),
    Reference(usize),
}

impl AddressField {
    /// Bit-stack flag selecting this form.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        match self {
            Self::Raw(address) => out.extend_from_slice(address.as_slice()),
            Self::Reference(index) => vlq::write_usize(out, *index),
        }
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Raw(_) => ADDRESS_LEN,
            Self::Reference(index) => vlq::sizeof_usize(*index),
        }
    }
}

/// Read one address field whose form is given by `is_reference`. A
/// reference index may span at most `max_vlq_len` bytes.
///
/// Returns the field and bytes consumed. Resolution against a registry is
/// left to the caller.
pub fn read(
    data: &[u8],
    is_reference: bool,
    max_vlq_len: usize,
) -> Result<(AddressField, usize), AddressFieldError> {
    if is_reference {
        let (index, len) =
            vlq::read_usize_bounded(data, max_vlq_len).map_err(AddressFieldError::Index)?;
        Ok((AddressField::Reference(index), len))
    } else {
        let raw = data
            .get(..ADDRESS_LEN)
            .ok_or(AddressFieldError::ShortAddress {
                available: data.len(),
            })?;
        Ok((AddressField::Raw(Address::from_slice(raw)), ADDRESS_LEN))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AddressFieldError {
    #[error("registry index: {0}")]
    Index(vlq::VlqError),
    #[error("raw address needs 20 bytes, {available} available")]
    ShortAddress { available: usize },
}
