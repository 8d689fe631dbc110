//! Site-section category taxonomy and keyword pattern table.
//!
//! The pattern table is an ordered slice, not a map: keywords are matched by
//! substring containment against a URL's first path segment, and substring
//! overlaps make the iteration order a tie-breaking rule (e.g.
//! "categoria-producto" contains both a Product and a Product-Category
//! keyword, and the earlier entry wins).

/// Label for URLs whose path is empty or just `/`.
pub const HOMEPAGE: &str = "Homepage";

/// Label for URLs the detector could not classify.
pub const OTHER: &str = "Other";

/// Label assigned by the deep-path fallback (≥2 path segments, no keyword hit).
pub const PRODUCT: &str = "Product";

/// Minimum cosine similarity for adopting a master-list label during
/// semantic reconciliation.
pub const SIMILARITY_THRESHOLD: f32 = 0.6;

/// Confidence assigned when a detected label is kept without an exact or
/// semantic match against the active category list.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Keyword patterns per category, in priority order.
///
/// Keywords are lowercase and multilingual (English + Spanish storefront
/// conventions). A category claims a first path segment when any of its
/// keywords occurs as a substring of that segment; earlier entries win.
pub const PATTERN_TABLE: &[(&str, &[&str])] = &[
    (
        PRODUCT,
        &[
            "shop", "producto", "product", "productos", "products", "item", "p",
        ],
    ),
    (
        "Product-Category",
        &[
            "categoria-producto",
            "category",
            "categoria",
            "categories",
            "cat",
        ],
    ),
    ("Brand", &["marca", "brand", "brands", "marcas"]),
    (
        "Blog",
        &["blog", "articulo", "article", "post", "news", "noticias"],
    ),
    ("Contact", &["contacto", "contact", "contact-us"]),
    (
        "About",
        &["nosotros", "about", "about-us", "quienes-somos", "empresa"],
    ),
    (
        "Wishlist",
        &["wishlist", "favoritos", "favorites", "lista-deseos"],
    ),
    ("Cart", &["cart", "carrito", "checkout", "bag"]),
    (
        "Account",
        &["mi-cuenta", "account", "profile", "perfil", "dashboard"],
    ),
];
