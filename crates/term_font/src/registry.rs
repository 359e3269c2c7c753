//! System font discovery for fallback families, via `fontdb`.
//!
//! Grounded in the teacher's `FontRegistry`: load the system font database
//! once, then query it by generic family or candidate name for each
//! fallback role the collection wants (Latin monospace, CJK, emoji, a
//! full-coverage backup). A role with no match on this system is simply
//! omitted — `FontCollection::new` only requires the primary regular face.

use std::sync::Arc;

use fontdb::{Database, Family, Query, Source};
use term_core::{FontSize, FontStyle};

use crate::face::{CoverageHint, FontFace, FontFamily, FontSource};

/// One fallback role to try to fill from the system font database.
struct FallbackRole {
    coverage: CoverageHint,
    candidates: &'static [&'static str],
    generic: Option<Family<'static>>,
}

const ROLES: &[FallbackRole] = &[
    FallbackRole {
        coverage: CoverageHint::Latin,
        candidates: &["DejaVu Sans Mono", "Liberation Mono", "Menlo", "Consolas"],
        generic: Some(Family::Monospace),
    },
    FallbackRole {
        coverage: CoverageHint::Cjk,
        candidates: &[
            "Noto Sans CJK SC",
            "Noto Sans CJK JP",
            "Source Han Sans SC",
            "PingFang SC",
            "Microsoft YaHei",
        ],
        generic: None,
    },
    FallbackRole {
        coverage: CoverageHint::Emoji,
        candidates: &[
            "Noto Color Emoji",
            "Apple Color Emoji",
            "Segoe UI Emoji",
            "Twitter Color Emoji",
        ],
        generic: None,
    },
    FallbackRole {
        coverage: CoverageHint::FullCoverage,
        candidates: &["DejaVu Sans", "Arial Unicode MS", "Noto Sans", "FreeSans"],
        generic: Some(Family::SansSerif),
    },
];

fn load_bytes(db: &Database, id: fontdb::ID) -> Option<(Vec<u8>, u32)> {
    let (source, face_index) = db.face_source(id)?;
    let data = match source {
        Source::File(path) => std::fs::read(&path).ok()?,
        Source::Binary(arc) => arc.as_ref().as_ref().to_vec(),
        Source::SharedFile(_path, data) => data.as_ref().as_ref().to_vec(),
    };
    Some((data, face_index))
}

fn query_role(db: &Database, role: &FallbackRole) -> Option<(fontdb::ID, String)> {
    for name in role.candidates {
        let query = Query {
            families: &[Family::Name(name)],
            ..Query::default()
        };
        if let Some(id) = db.query(&query) {
            return Some((id, (*name).to_string()));
        }
    }
    if let Some(generic) = role.generic {
        let query = Query {
            families: &[generic],
            ..Query::default()
        };
        if let Some(id) = db.query(&query) {
            return Some((id, format!("{generic:?}")));
        }
    }
    None
}

/// Loads the system font database and resolves whichever fallback roles
/// have a match on this machine. Regular-only: a fallback family only ever
/// needs its regular face, since `FontFamily::get` already falls back to
/// regular for any style it lacks.
pub fn discover_fallback_families(size: FontSize) -> Vec<FontFamily> {
    let mut db = Database::new();
    db.load_system_fonts();

    let mut families = Vec::new();
    for role in ROLES {
        let Some((id, matched_name)) = query_role(&db, role) else {
            tracing::debug!(coverage = ?role.coverage, "no system font found for fallback role");
            continue;
        };
        let Some((data, face_index)) = load_bytes(&db, id) else {
            continue;
        };
        let face = match FontFace::load(
            Arc::new(data),
            face_index,
            FontSource::SystemName(matched_name),
            role.coverage,
            size,
        ) {
            Ok(face) => face,
            Err(err) => {
                tracing::warn!("failed to parse system fallback font: {err}");
                continue;
            }
        };
        let mut family = FontFamily::default();
        family.set(FontStyle::Regular, face);
        families.push(family);
    }
    families
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_never_panics_with_or_without_system_fonts() {
        let size = FontSize { points: 12.0, dpi: 96 };
        // Just checks this runs to completion; CI may have zero fonts.
        let _ = discover_fallback_families(size);
    }
}
