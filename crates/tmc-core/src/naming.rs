use crate::VariantKey;

/// Human-readable description of a variant. Downstream reporting groups
/// results by this exact string, so it must be a stable pure function of
/// the key.
pub fn describe(variant: &VariantKey) -> String {
    let mut desc = format!(
        "{} {} {}-bit O{}",
        variant.base_name,
        variant.os.as_str(),
        variant.bits.width(),
        variant.opt.level()
    );
    if variant.static_link {
        desc.push_str(" static");
    }
    desc
}

/// Where the compiled binary lands, relative to the checkout root.
pub fn binary_path(variant: &VariantKey) -> String {
    let mut path = format!(
        "unittest/bin/{}-{}-{}-O{}",
        variant.base_name,
        variant.os.as_str(),
        variant.bits.arch(),
        variant.opt.level()
    );
    if variant.static_link {
        path.push_str("-static");
    }
    path
}
