// Action-stream encoder and decoder.
//
// Wire layout:
//
//   Stream := VLQ(count) BitStack(count) Action*(count)
//   Action := AddrField PseudoFloat VLQ(dataLen) Bytes(dataLen)
//
// Decoding is a single left-to-right pass with no backtracking. Encoding
// is a pure function of the actions, the registry snapshot and the
// resolver.

use log::{Level, debug, log_enabled, trace, warn};

use crate::action::Action;

use super::address_ref::{
    self, ADDRESS_LEN, AddressField, AddressFieldError, AddressRegistry, AddressResolver,
    NoResolution,
};
use super::bit_stack;
use super::error::{DecodeError, EncodeError};
use super::pseudo_float::{self, PseudoFloat};
use super::vlq::{self, VlqError};

/// Bytes a value occupies in a plain ABI-encoded call.
const ABI_WORD_LEN: usize = 32;

/// Default cap on the length of a single VLQ (448 payload bits).
pub const DEFAULT_MAX_VLQ_LEN: usize = 64;

/// Default cap on a pseudo-float exponent.
pub const DEFAULT_MAX_EXPONENT: usize = 1024;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for [`StreamEncoder`].
///
/// The limits mirror [`DecodeOptions`]: a batch the matching decoder would
/// refuse fails to encode instead.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// Fail with `AddressResolutionFailure` instead of falling back to a
    /// raw address when a resolver proposes an index the snapshot does not
    /// confirm.
    pub strict_references: bool,
    /// Longest VLQ the encoder may emit.
    pub max_vlq_len: usize,
    /// Largest pseudo-float exponent the encoder may emit.
    pub max_exponent: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            strict_references: false,
            max_vlq_len: DEFAULT_MAX_VLQ_LEN,
            max_exponent: DEFAULT_MAX_EXPONENT,
        }
    }
}

/// Limits applied by [`StreamDecoder`].
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Longest VLQ accepted for any field.
    pub max_vlq_len: usize,
    /// Largest pseudo-float exponent accepted.
    pub max_exponent: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_vlq_len: DEFAULT_MAX_VLQ_LEN,
            max_exponent: DEFAULT_MAX_EXPONENT,
        }
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Counters gathered while encoding one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub actions: usize,
    /// Destinations sent as registry indices.
    pub references: usize,
    /// Destinations sent as raw 20-byte addresses.
    pub raw_addresses: usize,
    /// Resolver proposals rejected by the snapshot check.
    pub fallbacks: usize,
    /// Size of the encoded stream.
    pub encoded_len: usize,
    /// Size of the same batch as plain `(address, uint256, bytes)` fields.
    pub plain_len: usize,
}

impl EncodeStats {
    /// `encoded_len / plain_len`, or 1.0 for an empty batch.
    pub fn ratio(&self) -> f64 {
        if self.plain_len == 0 {
            1.0
        } else {
            self.encoded_len as f64 / self.plain_len as f64
        }
    }
}

/// Output of one encode call.
#[derive(Debug, Clone)]
pub struct EncodedStream {
    pub bytes: Vec<u8>,
    pub stats: EncodeStats,
}

/// Encodes batches of actions.
///
/// The resolver decides which destinations may be sent as registry
/// references. The default ([`NoResolution`]) sends every address raw.
#[derive(Debug, Clone, Default)]
pub struct StreamEncoder<R = NoResolution> {
    resolver: R,
    options: EncodeOptions,
}

impl StreamEncoder<NoResolution> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: AddressResolver> StreamEncoder<R> {
    pub fn with_resolver(resolver: R) -> Self {
        Self {
            resolver,
            options: EncodeOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode `actions` against a registry `snapshot`.
    ///
    /// The snapshot is taken by value. Raw destinations are registered on
    /// it as the decoder will register them, so later actions in the same
    /// batch may reference addresses introduced by earlier ones.
    ///
    /// Fails with `VlqTooLong` or `ExponentTooLarge` when a field would not
    /// fit the configured limits.
    pub fn encode(
        &self,
        actions: &[Action],
        snapshot: AddressRegistry,
    ) -> Result<EncodedStream, EncodeError> {
        let mut registry = snapshot;
        let mut stats = EncodeStats {
            actions: actions.len(),
            ..Default::default()
        };

        let mut fields = Vec::with_capacity(actions.len());
        for (i, action) in actions.iter().enumerate() {
            let field = self.choose_field(i, action, &registry, &mut stats)?;
            match field {
                AddressField::Raw(address) => {
                    registry.register(address);
                    stats.raw_addresses += 1;
                }
                AddressField::Reference(_) => stats.references += 1,
            }
            trace!("action {i}: {field:?}, {} data byte(s)", action.data.len());
            fields.push(field);
        }

        let flags: Vec<bool> = fields.iter().map(AddressField::is_reference).collect();
        let values: Vec<PseudoFloat> = actions
            .iter()
            .map(|a| PseudoFloat::from_value(&a.value))
            .collect();
        self.check_limits(actions, &fields, &values)?;

        let capacity = vlq::sizeof_usize(actions.len())
            + bit_stack::byte_len(actions.len())
            + actions
                .iter()
                .zip(&fields)
                .zip(&values)
                .map(|((a, f), v)| {
                    f.encoded_len() + v.encoded_len() + vlq::sizeof_usize(a.data.len()) + a.data.len()
                })
                .sum::<usize>();

        let mut bytes = Vec::with_capacity(capacity);
        vlq::write_usize(&mut bytes, actions.len());
        bit_stack::write(&mut bytes, &flags);
        for ((action, field), value) in actions.iter().zip(&fields).zip(&values) {
            field.write(&mut bytes);
            value.write(&mut bytes);
            vlq::write_usize(&mut bytes, action.data.len());
            bytes.extend_from_slice(&action.data);
        }
        debug_assert_eq!(bytes.len(), capacity);

        stats.encoded_len = bytes.len();
        stats.plain_len = actions
            .iter()
            .map(|a| ADDRESS_LEN + ABI_WORD_LEN + a.data.len())
            .sum();

        debug!(
            "encoded {} action(s) into {} bytes ({} reference(s), {} fallback(s))",
            stats.actions, stats.encoded_len, stats.references, stats.fallbacks
        );
        if log_enabled!(Level::Trace) {
            trace!("stream: 0x{}", hex::encode(&bytes));
        }

        Ok(EncodedStream { bytes, stats })
    }

    fn check_limits(
        &self,
        actions: &[Action],
        fields: &[AddressField],
        values: &[PseudoFloat],
    ) -> Result<(), EncodeError> {
        let limit = self.options.max_vlq_len;
        let max_exponent = self.options.max_exponent.min(pseudo_float::MAX_EXPONENT);

        check_vlq_len(vlq::sizeof_usize(actions.len()), limit, || {
            "action count".to_string()
        })?;
        for (i, ((action, field), value)) in actions.iter().zip(fields).zip(values).enumerate() {
            if let AddressField::Reference(index) = field {
                check_vlq_len(vlq::sizeof_usize(*index), limit, || {
                    format!("action {i} registry index")
                })?;
            }
            if value.exponent > max_exponent {
                return Err(EncodeError::ExponentTooLarge {
                    action: i,
                    exponent: value.exponent,
                    limit: max_exponent,
                });
            }
            check_vlq_len(vlq::sizeof_usize(value.exponent), limit, || {
                format!("action {i} exponent")
            })?;
            check_vlq_len(vlq::sizeof_biguint(&value.mantissa), limit, || {
                format!("action {i} mantissa")
            })?;
            check_vlq_len(vlq::sizeof_usize(action.data.len()), limit, || {
                format!("action {i} data length")
            })?;
        }
        Ok(())
    }

    fn choose_field(
        &self,
        i: usize,
        action: &Action,
        registry: &AddressRegistry,
        stats: &mut EncodeStats,
    ) -> Result<AddressField, EncodeError> {
        let Some(claimed) = self.resolver.resolve(&action.to, registry) else {
            return Ok(AddressField::Raw(action.to));
        };
        if registry.confirms(claimed, &action.to) {
            return Ok(AddressField::Reference(claimed));
        }
        let err = EncodeError::AddressResolutionFailure {
            action: i,
            address: action.to,
            claimed,
            registry_len: registry.len(),
        };
        if self.options.strict_references {
            return Err(err);
        }
        warn!("{err}; sending raw address");
        stats.fallbacks += 1;
        Ok(AddressField::Raw(action.to))
    }
}

fn check_vlq_len(
    len: usize,
    limit: usize,
    field: impl FnOnce() -> String,
) -> Result<(), EncodeError> {
    if len > limit {
        return Err(EncodeError::VlqTooLong {
            field: field(),
            len,
            limit,
        });
    }
    Ok(())
}

/// Encode with a resolver and default options, returning only the bytes.
pub fn encode<R: AddressResolver>(
    actions: &[Action],
    snapshot: AddressRegistry,
    resolver: R,
) -> Result<Vec<u8>, EncodeError> {
    StreamEncoder::with_resolver(resolver)
        .encode(actions, snapshot)
        .map(|e| e.bytes)
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Forward-only reader that attaches offsets to every failure.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    options: &'a DecodeOptions,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn vlq_error(&self, e: VlqError, context: &'static str) -> DecodeError {
        match e {
            VlqError::Underflow => DecodeError::TruncatedStream {
                offset: self.pos,
                context,
            },
            other => DecodeError::MalformedNumber {
                offset: self.pos,
                context,
                reason: other.to_string(),
            },
        }
    }

    fn read_usize(&mut self, context: &'static str) -> Result<usize, DecodeError> {
        let (val, len) = vlq::read_usize_bounded(self.rest(), self.options.max_vlq_len)
            .map_err(|e| self.vlq_error(e, context))?;
        self.pos += len;
        Ok(val)
    }

    fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let rest = self.rest();
        if rest.len() < len {
            return Err(DecodeError::TruncatedStream {
                offset: self.pos,
                context,
            });
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn read_flags(&mut self, count: usize) -> Result<Vec<bool>, DecodeError> {
        let flags = bit_stack::read(self.rest(), count).ok_or(DecodeError::TruncatedStream {
            offset: self.pos,
            context: "bit-stack",
        })?;
        self.pos += bit_stack::byte_len(count);
        Ok(flags)
    }

    fn read_address_field(&mut self, is_reference: bool) -> Result<AddressField, DecodeError> {
        let max_len = self.options.max_vlq_len;
        let (field, len) = address_ref::read(self.rest(), is_reference, max_len).map_err(|e| match e {
            AddressFieldError::Index(v) => self.vlq_error(v, "registry index"),
            AddressFieldError::ShortAddress { .. } => DecodeError::TruncatedStream {
                offset: self.pos,
                context: "raw address",
            },
        })?;
        self.pos += len;
        Ok(field)
    }

    fn read_value(&mut self) -> Result<PseudoFloat, DecodeError> {
        let (pf, len) = pseudo_float::read(
            self.rest(),
            self.options.max_vlq_len,
            self.options.max_exponent,
        )
        .map_err(|e| {
            if e.is_truncation() {
                DecodeError::TruncatedStream {
                    offset: self.pos,
                    context: "pseudo-float",
                }
            } else {
                DecodeError::MalformedNumber {
                    offset: self.pos,
                    context: "pseudo-float",
                    reason: e.to_string(),
                }
            }
        })?;
        self.pos += len;
        Ok(pf)
    }
}

/// Conformance decoder for action streams.
///
/// Mirrors what the on-chain decoder must accept. Raw destinations are
/// registered on the supplied registry as they are read; if decoding fails
/// the registry is restored to its prior length.
#[derive(Debug, Clone, Default)]
pub struct StreamDecoder {
    options: DecodeOptions,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: DecodeOptions) -> Self {
        Self { options }
    }

    /// Decode a complete stream. Surplus bytes are `TrailingBytes`.
    pub fn decode(
        &self,
        data: &[u8],
        registry: &mut AddressRegistry,
    ) -> Result<Vec<Action>, DecodeError> {
        let (actions, consumed) = self.decode_prefix(data, registry)?;
        if consumed != data.len() {
            return Err(DecodeError::TrailingBytes {
                offset: consumed,
                count: data.len() - consumed,
            });
        }
        Ok(actions)
    }

    /// Decode one stream from the front of `data`, returning the actions
    /// and the number of bytes consumed.
    pub fn decode_prefix(
        &self,
        data: &[u8],
        registry: &mut AddressRegistry,
    ) -> Result<(Vec<Action>, usize), DecodeError> {
        let checkpoint = registry.len();
        let result = self.decode_inner(data, registry);
        if let Err(e) = &result {
            debug!("decode failed ({}): {e}", e.kind());
            registry.truncate(checkpoint);
        }
        result
    }

    fn decode_inner(
        &self,
        data: &[u8],
        registry: &mut AddressRegistry,
    ) -> Result<(Vec<Action>, usize), DecodeError> {
        let mut cur = Cursor {
            data,
            pos: 0,
            options: &self.options,
        };

        let count = cur.read_usize("action count")?;
        let flags = cur.read_flags(count)?;
        let mut actions = Vec::with_capacity(count.min(cur.rest().len()));

        for (i, &is_reference) in flags.iter().enumerate() {
            let field_offset = cur.pos;
            let to = match cur.read_address_field(is_reference)? {
                AddressField::Raw(address) => {
                    registry.register(address);
                    address
                }
                AddressField::Reference(index) => {
                    registry
                        .lookup(index)
                        .ok_or(DecodeError::InvalidReference {
                            offset: field_offset,
                            index,
                            registry_len: registry.len(),
                        })?
                }
            };
            let value = cur.read_value()?.to_value();
            let data_len = cur.read_usize("data length")?;
            let payload = cur.read_bytes(data_len, "data")?;
            trace!("action {i}: to {to}, {data_len} data byte(s)");
            actions.push(Action::new(to, value, payload));
        }

        debug!("decoded {} action(s) from {} bytes", actions.len(), cur.pos);
        Ok((actions, cur.pos))
    }
}

/// Decode a complete stream with default limits.
pub fn decode(data: &[u8], registry: &mut AddressRegistry) -> Result<Vec<Action>, DecodeError> {
    StreamDecoder::new().decode(data, registry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
