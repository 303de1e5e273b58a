pub mod fingerprint;
pub mod perfume;
pub mod tags;

pub use fingerprint::{Fingerprint, SuggestRequest};
pub use perfume::{
    EnrichedNote, GlueKey, Perfume, PerfumeIdentity, Properties, Ranked, Sex, ShopInfo, Variant,
};
pub use tags::TagRequest;
