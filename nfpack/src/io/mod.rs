mod svg_export;

#[doc(inline)]
pub use svg_export::packed_bin_to_svg;
