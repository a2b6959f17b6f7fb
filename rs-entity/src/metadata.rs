//! Bit-flag fields read from the raw entity metadata bytes.

/// Byte positions and masks for the flags the viewer cares about. The armor stand
/// flags moved between protocol versions, so the layout is picked from the version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataLayout {
    pub flags_index: usize,
    pub invisible_mask: u8,
    pub armor_stand_flags_index: usize,
    pub marker_mask: u8,
    /// 1.8 and older skeletons carry their variant in a metadata byte instead of a kind tag.
    pub skeleton_type_index: Option<usize>,
}

impl Default for MetadataLayout {
    fn default() -> Self {
        Self {
            flags_index: 0,
            invisible_mask: 0x20,
            armor_stand_flags_index: 15,
            marker_mask: 0x10,
            skeleton_type_index: None,
        }
    }
}

impl MetadataLayout {
    pub fn for_version(version: &str) -> Self {
        if is_legacy_version(version) {
            Self {
                armor_stand_flags_index: 10,
                skeleton_type_index: Some(13),
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    /// Missing bytes read as zero.
    pub fn flags(&self, metadata: &[u8]) -> EntityFlags {
        let byte = |idx: usize| metadata.get(idx).copied().unwrap_or(0);
        EntityFlags {
            invisible: byte(self.flags_index) & self.invisible_mask != 0,
            marker: byte(self.armor_stand_flags_index) & self.marker_mask != 0,
        }
    }

    pub fn skeleton_type(&self, metadata: &[u8]) -> Option<u8> {
        self.skeleton_type_index
            .map(|idx| metadata.get(idx).copied().unwrap_or(0))
    }
}

fn is_legacy_version(version: &str) -> bool {
    let mut parts = version.split('.');
    matches!((parts.next(), parts.next()), (Some("1"), Some(minor)) if minor.parse::<u32>().is_ok_and(|m| m <= 8))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntityFlags {
    pub invisible: bool,
    pub marker: bool,
}

impl EntityFlags {
    /// Invisible entities and marker armor stands render see-through and drop no shadow.
    pub fn is_translucent(&self) -> bool {
        self.invisible || self.marker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invisible_and_marker_bits() {
        let layout = MetadataLayout::for_version("1.16.4");
        assert!(!layout.flags(&[]).is_translucent());
        assert!(layout.flags(&[0x20]).invisible);
        assert!(!layout.flags(&[0x1f]).invisible);

        let mut marker = vec![0u8; 16];
        marker[15] = 0x10;
        let flags = layout.flags(&marker);
        assert!(flags.marker && !flags.invisible);
        assert!(flags.is_translucent());
    }

    #[test]
    fn legacy_versions_use_the_old_layout() {
        let legacy = MetadataLayout::for_version("1.8.9");
        assert_eq!(legacy.armor_stand_flags_index, 10);
        assert_eq!(legacy.skeleton_type(&[0; 14]), Some(0));

        let mut wither = vec![0u8; 14];
        wither[13] = 1;
        assert_eq!(legacy.skeleton_type(&wither), Some(1));

        let modern = MetadataLayout::for_version("1.12.2");
        assert_eq!(modern, MetadataLayout::default());
        assert_eq!(modern.skeleton_type(&wither), None);
        assert_eq!(MetadataLayout::for_version("garbage"), MetadataLayout::default());
        assert_eq!(MetadataLayout::for_version("1.9.4"), MetadataLayout::default());
        assert_eq!(MetadataLayout::for_version("1.8"), legacy);
    }
}
