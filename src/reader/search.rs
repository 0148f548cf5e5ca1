use tracing::{debug, trace, warn};

use super::{
    binarize::BitMatrix,
    finder::{group_finders, locate_finders, FinderGroup},
    result::ResultSet,
    symbol::Symbol,
    QRReader,
};

// Half the side of the square painted over a finder, in modules. Covers the
// pattern plus its separator.
const FINDER_HALF_SIDE: f64 = 4.5;

// Multi-symbol search
// 1. Locates and groups finders on a private copy of the page
// 2. Decodes every group of the pass in rank order
// 3. Paints each sampled symbol light so later passes look elsewhere. Groups
//    whose geometry fails get only their finders painted
// 4. Stops on a pass without groups, on reaching the symbol cap or after the
//    pass cap
//------------------------------------------------------------------------------

pub fn search(page: &BitMatrix, opts: &QRReader) -> ResultSet {
    let mut img = page.clone();
    let mut res = ResultSet::new();
    let mut found = 0;

    'passes: for pass in 0..opts.max_passes {
        let finders = locate_finders(&img, opts.max_finder_candidates);
        let groups = group_finders(&img, &finders);
        debug!("Pass {pass}: {} finders, {} groups", finders.len(), groups.len());
        if groups.is_empty() {
            break;
        }

        for group in groups {
            if found >= opts.max_symbols {
                break 'passes;
            }

            let sym = match Symbol::locate(&img, &group) {
                Ok(sym) => sym,
                Err(e) => {
                    warn!("Dropping finder group at {:?}: {e}", group.tl());
                    erase_finders(&mut img, &group);
                    res.push_failure(e, None);
                    continue;
                }
            };

            let corners = sym.corners();
            let region = match sym.region() {
                Ok(region) => region,
                Err(e) => {
                    warn!("Dropping finder group at {:?}: {e}", group.tl());
                    erase_finders(&mut img, &group);
                    res.push_failure(e, Some(corners));
                    continue;
                }
            };

            match sym.decode(&img, &group) {
                Ok(decoded) => {
                    trace!("Decoded {} symbol: {:?}", decoded.version, decoded.text);
                    res.push(decoded);
                    found += 1;
                }
                Err(e) => {
                    warn!("Symbol at {:?} failed to decode: {e}", corners[0]);
                    res.push_failure(e, Some(corners));
                }
            }
            img.fill_quad(&region, false);
        }
    }

    res.finish()
}

// Squares follow the symbol axes so tilted finders are covered too
fn erase_finders(img: &mut BitMatrix, group: &FinderGroup) {
    let r = FINDER_HALF_SIDE * group.module;
    let (u, v) = group.axes();
    let (u, v) = (u * r, v * r);
    for c in group.finders {
        let quad = [c - u - v, c + u - v, c + u + v, c - u + v];
        img.fill_quad(&quad, false);
    }
}

#[cfg(test)]
mod search_tests {
    use image::GrayImage;
    use qrcode::EcLevel;

    use super::{erase_finders, search};
    use crate::reader::binarize::BitMatrix;
    use crate::reader::finder::{group_finders, locate_finders};
    use crate::reader::luma::Luminance;
    use crate::reader::test_utils::{draw_code, qr_code};
    use crate::reader::QRReader;

    fn prepare(img: &GrayImage) -> BitMatrix {
        BitMatrix::prepare(&img.to_luma_grid().unwrap()).unwrap()
    }

    // Three symbols on one page, listed in reading order
    fn three_symbols() -> (BitMatrix, [&'static str; 3]) {
        let texts = ["FIRST", "Second symbol", "3RD"];
        let mut img = GrayImage::from_pixel(360, 300, image::Luma([255]));
        draw_code(&mut img, &qr_code(texts[0], 1, EcLevel::M), 20, 20, 3);
        draw_code(&mut img, &qr_code(texts[1], 2, EcLevel::L), 200, 40, 3);
        draw_code(&mut img, &qr_code(texts[2], 1, EcLevel::H), 60, 180, 3);
        (prepare(&img), texts)
    }

    #[test]
    fn test_search_multiple() {
        let (img, texts) = three_symbols();
        let res = search(&img, &QRReader::new());
        assert_eq!(res.texts(), texts);
        assert!(res.failures().is_empty());
    }

    #[test]
    fn test_search_leaves_page_untouched() {
        let (img, _) = three_symbols();
        let copy = img.clone();
        let _ = search(&img, &QRReader::new());
        assert_eq!(img, copy);
    }

    #[test]
    fn test_symbol_cap() {
        let (img, _) = three_symbols();
        let res = search(&img, QRReader::new().max_symbols(2));
        assert_eq!(res.len(), 2);
    }

    #[test]
    fn test_pass_cap() {
        let (img, _) = three_symbols();
        let res = search(&img, QRReader::new().max_passes(0));
        assert!(res.is_empty());
    }

    #[test]
    fn test_undecodable_symbol_recorded() {
        let mut page = GrayImage::from_pixel(200, 120, image::Luma([255]));
        draw_code(&mut page, &qr_code("KEEP", 1, EcLevel::L), 10, 10, 3);
        draw_code(&mut page, &qr_code("LOSE", 1, EcLevel::L), 110, 10, 3);
        let mut img = prepare(&page);

        // Blank out the data region of the right symbol, keeping its finders
        // and timing patterns
        let (ox, oy) = (110, 10);
        img.fill_rect(ox + 9 * 3, oy + 9 * 3, ox + 21 * 3 - 1, oy + 21 * 3 - 1, false);

        let res = search(&img, &QRReader::new());
        assert_eq!(res.texts(), ["KEEP"]);
        assert_eq!(res.failures().len(), 1);
        assert!(res.failures()[0].error.is_symbol_local());
        assert!(res.failures()[0].corners.is_some());
    }

    #[test]
    fn test_erase_finders() {
        let mut page = GrayImage::from_pixel(100, 100, image::Luma([255]));
        draw_code(&mut page, &qr_code("ERASE", 1, EcLevel::L), 10, 10, 3);
        let mut img = prepare(&page);
        let groups = group_finders(&img, &locate_finders(&img, 16));
        assert_eq!(groups.len(), 1);

        erase_finders(&mut img, &groups[0]);
        assert!(locate_finders(&img, 16).is_empty());
    }

    #[test]
    fn test_no_symbols() {
        let img = BitMatrix::new(50, 50);
        let res = search(&img, &QRReader::new());
        assert!(res.is_empty());
        assert!(res.failures().is_empty());
    }
}
