//! Data tables consulted by the scheduler, upstream client, and
//! classifiers. Kept as plain data (not code) per the source's own
//! convention of never re-deriving these catalogues at runtime.

use std::time::Duration;

/// One tick of the scheduler's ticker, see `scheduler::Scheduler::run`.
pub const MAIN_LOOP_INTERVAL_DEFAULT_S: u64 = 1;
pub const MAX_CONCURRENT_TASKS_DEFAULT: usize = 3;
pub const STAGGER_DELAY_DEFAULT_MS: u64 = 200;
pub const EBAY_DAILY_LIMIT_DEFAULT: u32 = 4500;
pub const HEALTH_PORT_DEFAULT: u16 = 3001;

/// How often (in ticks) the cleanup sweep and "no active tasks" log run.
pub const CLEANUP_EVERY_N_TICKS: u64 = 60;
pub const IDLE_LOG_EVERY_N_TICKS: u64 = 30;
pub const WAITING_LOG_EVERY_N_TICKS: u64 = 10;

pub const CREDENTIAL_COOLDOWN: Duration = Duration::from_secs(5 * 60);
pub const ITEM_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const REJECTION_TTL: Duration = Duration::from_secs(48 * 60 * 60);
pub const METAL_PRICE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);
pub const TOKEN_REFRESH_SKEW: Duration = Duration::from_secs(60);

pub const SEARCH_PAGE_LIMIT: u32 = 200;
pub const BULK_FETCH_BATCH_SIZE: usize = 20;
pub const PRIORITY_WINDOW_MINUTES: i64 = 10;

/// Undocumented refiner-payout share applied to melt value before the
/// profit gate. Preserved verbatim from the source; origin unknown.
pub const SCRAP_PAYOUT_FACTOR: f64 = 0.97;
/// Minimum ratio of melt-after-payout to total cost required to survive
/// the profit gate (`breakEven <= MIN_BREAKEVEN_RATIO * totalCost` rejects).
pub const MIN_BREAKEVEN_RATIO: f64 = 0.5;
/// Suggested offer price as a fraction of total cost, used in notifications.
pub const OFFER_SUGGESTION_RATIO: f64 = 0.87;

pub const MARKETPLACE_ID: &str = "EBAY_US";

/// Fixed OAuth scope requested on every client-credentials token grant.
pub const UPSTREAM_OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";
pub const UPSTREAM_OAUTH_URL: &str = "https://api.ebay.com/identity/v1/oauth2/token";
pub const UPSTREAM_SEARCH_URL: &str = "https://api.ebay.com/buy/browse/v1/item_summary/search";
pub const UPSTREAM_ITEM_URL: &str = "https://api.ebay.com/buy/browse/v1/item";

/// Metal names the worker knows how to search and price. "Silver" family
/// is intentionally excluded from the dynamically-generated
/// unselected-metal exclusion list (see `classify::jewelry::exclusion_set`)
/// to avoid over-blocking mixed-metal listings.
pub const METAL_KEYWORDS: &[&str] = &["gold", "silver", "platinum", "palladium"];

/// British/American karat notations accepted by the karat extractor.
pub const KARAT_MARKERS: &[&str] = &[
    "8k", "8kt", "8 karat", "8 carat", "8ct",
    "9k", "9kt", "9 karat", "9 carat", "9ct",
    "10k", "10kt", "10 karat", "10 carat", "10ct",
    "14k", "14kt", "14 karat", "14 carat", "14ct",
    "18k", "18kt", "18 karat", "18 carat", "18ct",
    "22k", "22kt", "22 karat", "22 carat", "22ct",
    "24k", "24kt", "24 karat", "24 carat", "24ct",
];

/// Costume/fashion and tool-listing keywords excluded from every jewelry
/// task regardless of what the task itself specifies.
pub const JEWELRY_FIXED_EXCLUSIONS: &[&str] = &[
    "costume jewelry",
    "fashion jewelry",
    "cosplay",
    "rhinestone",
    "faux",
    "imitation",
    "replica",
    "novelty",
    "toy ring",
    "snap jewelry",
    "jewelry making",
    "jewelry tool",
    "jewelry tools",
    "repair kit",
    "polishing cloth",
    "display stand",
    "jewelry box",
    "storage case",
    "magnifying loupe",
    "cleaning kit",
];

/// Markers that indicate plated/filled/non-solid construction rather than
/// solid precious metal.
pub const PLATE_GUARD_KEYWORDS: &[&str] = &[
    "gold plated", "gold-plated", "gold plate", "gold filled", "gold-filled",
    "gf ", "gp ", "vermeil", "plated", "electroplate", "rolled gold",
    "gold tone", "gold-tone", "goldtone", "silver plated", "silver-plated",
    "silver tone", "silver-tone",
];

/// Exceptions to the "-tone" guard: genuine multi-metal solid pieces.
pub const MULTI_TONE_ALLOWED: &[&str] = &["two-tone", "two tone", "tri-tone", "tri tone"];

/// Title-only backup check for stone presence, consulted only when the
/// three spec fields (main stone, stone type, gemstone) are all empty.
pub const STONE_PRESENCE_KEYWORDS: &[&str] = &[
    "diamond", "ruby", "sapphire", "emerald", "opal", "pearl", "topaz",
    "amethyst", "garnet", "aquamarine", "peridot", "citrine", "turquoise",
    "moissanite", "cz", "cubic zirconia", "tanzanite", "morganite", "onyx",
    "jade", "stone", "gem", "gemstone",
];

/// 25 named stone types, ordered longest-match-first so "cubic zirconia"
/// is preferred over a bare "zirconia" substring match.
pub const STONE_TYPES: &[&str] = &[
    "cubic zirconia", "lab-grown diamond", "lab grown diamond",
    "moissanite", "tanzanite", "aquamarine", "tourmaline", "morganite",
    "alexandrite", "chalcedony", "turquoise", "amethyst", "citrine",
    "peridot", "sapphire", "emerald", "diamond", "garnet", "topaz",
    "opal", "pearl", "ruby", "jade", "onyx", "quartz",
];

pub const STONE_SHAPES: &[&str] = &[
    "round brilliant", "round", "princess", "cushion", "emerald cut",
    "oval", "marquise", "pear", "radiant", "asscher", "heart", "baguette",
    "trillion",
];

/// Certification labs, tiered by trust for the gemstone deal-score bonus.
pub const CERT_LABS_PREMIUM: &[&str] = &["gia", "ags"];
pub const CERT_LABS_STANDARD: &[&str] = &["igi", "gsl", "hrd"];
pub const CERT_LABS_BUDGET: &[&str] = &["gcal", "egl", "dgli"];

/// Treatment terms, tiered by how much they devalue a stone.
pub const TREATMENTS_HEAVY: &[&str] = &[
    "clarity enhanced", "fracture filled", "glass filled", "diffusion",
    "irradiated", "dyed",
];
pub const TREATMENTS_LIGHT: &[&str] = &["heated", "oiled", "waxed"];

/// Simulant / obviously-not-genuine terms that blacklist a gemstone
/// candidate outright.
pub const SIMULANT_BLACKLIST: &[&str] = &[
    "simulated", "simulant", "synthetic cz", "glass stone", "plastic gem",
    "resin stone", "faux gem",
];

/// Diamond letter color grades, consulted before the colored-stone name
/// table so "D color" isn't mistaken for a colored-stone description.
pub const DIAMOND_COLOR_GRADES: &[&str] = &[
    "d color", "e color", "f color", "g color", "h color", "i color",
    "j color", "k color", "l color", "m color",
];
/// Colored-stone hue names, for non-diamond gemstones.
pub const COLORED_STONE_COLORS: &[&str] = &[
    "pigeon blood", "royal blue", "cornflower blue", "vivid yellow",
    "padparadscha", "blue", "red", "pink", "yellow", "green", "purple",
    "orange", "brown", "black", "colorless", "white",
];
/// GIA clarity scale, longest-match-first ("vvs1" before "vs1"-adjacent
/// confusion is avoided by checking multi-char grades before single).
pub const CLARITY_GRADES: &[&str] = &[
    "fl", "if", "vvs1", "vvs2", "vs1", "vs2", "si1", "si2", "si3", "i1", "i2", "i3",
];
/// Plain-language eye-clean clarity descriptions sellers use instead of
/// the GIA scale.
pub const EYE_CLEAN_CLARITY_TERMS: &[&str] = &["eye clean", "eye-clean", "loupe clean"];
/// Diamond cut grades.
pub const CUT_GRADES: &[&str] = &["excellent", "very good", "good", "fair", "poor", "ideal", "super ideal"];

/// Vague-language markers the risk scorer penalises.
pub const VAGUE_LANGUAGE_MARKERS: &[&str] = &[
    "as is", "no returns accepted", "unknown origin", "estate find",
    "untested", "believed to be",
];

/// Known parent -> child category id pairs for gemstone listings, so a
/// "loose gemstones" parent category expands to its recognised children.
pub const GEMSTONE_CATEGORY_EXPANSIONS: &[(&str, &[&str])] = &[
    ("26436", &["26436", "164321", "164329"]),
    ("164318", &["164318", "164319", "164320"]),
];

/// Watch case materials, band materials, movements, and dial colors the
/// watch extractor recognises.
pub const WATCH_CASE_MATERIALS: &[&str] = &[
    "stainless steel", "titanium", "gold", "rose gold", "yellow gold",
    "white gold", "platinum", "ceramic", "carbon fiber", "bronze",
];
pub const WATCH_BAND_MATERIALS: &[&str] = &[
    "leather", "stainless steel", "rubber", "silicone", "nato", "mesh",
    "titanium", "ceramic", "fabric",
];
pub const WATCH_MOVEMENTS: &[&str] = &[
    "automatic", "manual wind", "quartz", "kinetic", "solar", "mechanical",
];
pub const WATCH_DIAL_COLORS: &[&str] = &[
    "black", "white", "blue", "silver", "green", "brown", "gray", "grey",
    "champagne", "mother of pearl", "gold", "red", "salmon",
];

/// Weight unit conversion factors into grams.
pub const GRAMS_PER_GRAIN: f64 = 0.0647989;
pub const GRAMS_PER_OUNCE: f64 = 28.349523;
pub const GRAMS_PER_PENNYWEIGHT: f64 = 1.55517384;
pub const GRAMS_PER_CARAT: f64 = 0.2;
pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;
pub const GRAMS_PER_POUND: f64 = 453.59237;
