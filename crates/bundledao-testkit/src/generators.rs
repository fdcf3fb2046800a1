//! Proptest generators for property-based testing.

use proptest::prelude::*;

use bundledao_core::{DataItem, DataItemBuilder, LocalSigner, Secp256k1Keypair, Tag};

/// Generate a keypair from a valid random scalar.
pub fn keypair() -> impl Strategy<Value = Secp256k1Keypair> {
    any::<[u8; 32]>().prop_filter_map("invalid scalar", |seed| {
        Secp256k1Keypair::from_bytes(&seed).ok()
    })
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a tag with a header-like name and a printable value.
pub fn tag() -> impl Strategy<Value = Tag> {
    ("[A-Za-z][A-Za-z0-9-]{0,31}", "[ -~]{1,64}").prop_map(|(name, value)| Tag::new(name, value))
}

/// Generate up to `max` tags.
pub fn tags(max: usize) -> impl Strategy<Value = Vec<Tag>> {
    prop::collection::vec(tag(), 0..=max)
}

/// Parameters for generating a data item.
#[derive(Debug, Clone)]
pub struct DataItemParams {
    pub keypair: Secp256k1Keypair,
    pub payload: Vec<u8>,
    pub tags: Vec<Tag>,
    pub target: Option<[u8; 32]>,
    pub anchor: Option<[u8; 32]>,
}

impl Arbitrary for DataItemParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            keypair(),
            payload(1000),
            tags(8),
            any::<Option<[u8; 32]>>(),
            any::<Option<[u8; 32]>>(),
        )
            .prop_map(|(keypair, payload, tags, target, anchor)| DataItemParams {
                keypair,
                payload,
                tags,
                target,
                anchor,
            })
            .boxed()
    }
}

fn builder_from_params(params: &DataItemParams) -> DataItemBuilder {
    let mut builder = DataItemBuilder::new(params.payload.clone()).tags(params.tags.iter().cloned());
    if let Some(target) = params.target {
        builder = builder.target(target);
    }
    if let Some(anchor) = params.anchor {
        builder = builder.anchor(anchor);
    }
    builder
}

/// Generate a signed data item from parameters.
///
/// Drives the async signer on a private current-thread runtime, so it must
/// not be called from inside another runtime.
pub fn data_item_from_params(params: &DataItemParams) -> DataItem {
    let signer = LocalSigner::new(params.keypair.clone());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime builds");
    runtime
        .block_on(builder_from_params(params).sign(&signer))
        .expect("local signing succeeds")
}
