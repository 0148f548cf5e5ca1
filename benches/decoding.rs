use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use image::{imageops, GrayImage, Luma};
use imageproc::{drawing::draw_filled_rect_mut, rect::Rect};
use pageqr::QRReader;
use qrcode::{Color, EcLevel, QrCode, Version};
use rayon::prelude::*;

// Synthetic pages with one symbol each, rotated in four directions
//------------------------------------------------------------------------------

const VERSIONS: [i16; 6] = [1, 5, 10, 20, 30, 40];
const EC_LEVELS: [(EcLevel, &str); 4] =
    [(EcLevel::L, "L"), (EcLevel::M, "M"), (EcLevel::Q, "Q"), (EcLevel::H, "H")];
const ANGLES: [u32; 4] = [0, 90, 180, 270];
const SCALE: u32 = 3;

fn render(code: &QrCode) -> GrayImage {
    let w = code.width();
    let side = (w as u32 + 8) * SCALE;
    let mut img = GrayImage::from_pixel(side, side, Luma([255]));
    let s = SCALE as i32;
    for (i, c) in code.to_colors().into_iter().enumerate() {
        if c == Color::Dark {
            let (x, y) = ((i % w) as i32 + 4, (i / w) as i32 + 4);
            draw_filled_rect_mut(&mut img, Rect::at(x * s, y * s).of_size(SCALE, SCALE), Luma([0]));
        }
    }
    img
}

// Fills roughly half the capacity with digits
fn payload(ver: i16, ecl: EcLevel) -> String {
    let len = match ecl {
        EcLevel::L => 30,
        EcLevel::M => 24,
        EcLevel::Q => 17,
        EcLevel::H => 13,
    } * ver as usize * ver as usize / 2
        + 10;
    (0..len).map(|i| char::from(b'0' + (i % 10) as u8)).collect()
}

fn median(times: &mut [u128]) -> u128 {
    times.sort_unstable();
    let mid = times.len() / 2;
    if times.len() % 2 == 1 {
        times[mid]
    } else {
        (times[mid - 1] + times[mid]) / 2
    }
}

fn benchmark() {
    let cases: Vec<_> = VERSIONS
        .iter()
        .flat_map(|&v| EC_LEVELS.iter().map(move |&(ecl, name)| (v, ecl, name)))
        .collect();

    let passes = Arc::new(Mutex::new(HashMap::<String, usize>::new()));
    let runtimes = Arc::new(Mutex::new(HashMap::<String, Vec<u128>>::new()));

    cases.par_iter().for_each(|&(ver, ecl, name)| {
        let data = payload(ver, ecl);
        let Ok(code) = QrCode::with_version(&data, Version::Normal(ver), ecl) else {
            println!("\x1b[1;31m[SKIP]\x1b[0m V{ver}-{name}: payload too long");
            return;
        };
        let page = render(&code);
        let key = format!("V{ver}");

        for angle in ANGLES {
            let img = match angle {
                90 => imageops::rotate90(&page),
                180 => imageops::rotate180(&page),
                270 => imageops::rotate270(&page),
                _ => page.clone(),
            };

            let start = Instant::now();
            let res = QRReader::new().decode(&img);
            let elapsed = start.elapsed().as_micros();
            runtimes.lock().unwrap().entry(key.clone()).or_default().push(elapsed);

            match res {
                Ok(res) if res.texts() == [data.as_str()] => {
                    *passes.lock().unwrap().entry(key.clone()).or_default() += 1;
                }
                _ => println!("\x1b[1;31m[FAIL]\x1b[0m V{ver}-{name} at {angle}deg"),
            }
        }
    });

    let passes = Arc::try_unwrap(passes).unwrap().into_inner().unwrap();
    let mut runtimes = Arc::try_unwrap(runtimes).unwrap().into_inner().unwrap();

    println!("\n{:<8}| {:<8}| {:<14}| {:<14}", "Version", "Passed", "median (us)", "avg (us)");
    println!("{}", "-".repeat(50));
    for ver in VERSIONS {
        let key = format!("V{ver}");
        let Some(times) = runtimes.get_mut(&key) else {
            continue;
        };
        let total = times.len();
        let avg = times.iter().sum::<u128>() / total as u128;
        let med = median(times);
        let ok = passes.get(&key).copied().unwrap_or(0);
        println!("{key:<8}| {:<8}| {med:<14}| {avg:<14}", format!("{ok}/{total}"));
    }
}

fn main() {
    let start = Instant::now();
    benchmark();
    println!("Time elapsed: {:?}", start.elapsed());
}
