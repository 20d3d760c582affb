/// How the revealed bids are turned into an improved clearing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhantomMechanism {
    /// Single-unit second-price: highest revealed price wins, pays the
    /// second-highest (or `base_price` if only one reveal).
    Vickrey,
    /// Finds a uniform `p'` clearing revealed demand against `base_quantity`;
    /// all winners pay `p'`.
    Uniform,
    /// Each winner pays their own revealed price; the reported improved price
    /// is the demand-weighted average of winning prices.
    Discriminatory,
}
