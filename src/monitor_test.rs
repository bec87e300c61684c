// Unit tests for action-template selection order

use std::fs;

use image::imageops;
use image::{GrayImage, Luma};
use pretty_assertions::assert_eq;

use super::*;
use crate::templates::DEFAULT_THRESHOLD;

fn textured(w: u32, h: u32, seed: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |x, y| {
        Luma([(((x * 11 + y * 17 + seed) * 29) % 249) as u8])
    })
}

fn debug_file_count(dir: &std::path::Path) -> usize {
    fs::read_dir(dir).unwrap().flatten().count()
}

#[test]
fn test_first_matching_template_wins() {
    let first = textured(14, 10, 1);
    let second = textured(14, 10, 2);

    let mut capture = GrayImage::from_pixel(120, 60, Luma([30u8]));
    imageops::replace(&mut capture, &first, 10, 10);
    imageops::replace(&mut capture, &second, 60, 10);

    let actions = vec![
        Template::from_image("action-1", first, DEFAULT_THRESHOLD),
        Template::from_image("action-2", second, DEFAULT_THRESHOLD),
    ];

    let (index, template, result) = select_action(&capture, &actions, None).unwrap();
    assert_eq!(index, 0);
    assert_eq!(template.label(), "action-1");
    assert_eq!(result.top_left, (10, 10));
}

#[test]
fn test_search_short_circuits_after_first_match() {
    let first = textured(14, 10, 1);
    let second = textured(14, 10, 2);

    let mut capture = GrayImage::from_pixel(120, 60, Luma([30u8]));
    imageops::replace(&mut capture, &first, 10, 10);
    imageops::replace(&mut capture, &second, 60, 10);

    let actions = vec![
        Template::from_image("action-1", first, DEFAULT_THRESHOLD),
        Template::from_image("action-2", second, DEFAULT_THRESHOLD),
    ];

    // One diagnostic artifact per attempt made; a lazy search that stops at
    // the first winner only ever attempts the first template here.
    let dir = tempfile::tempdir().unwrap();
    let (index, _, _) = select_action(&capture, &actions, Some(dir.path())).unwrap();
    assert_eq!(index, 0);
    assert_eq!(debug_file_count(dir.path()), 1);
    assert!(dir.path().join("match_action-1.png").is_file());
}

#[test]
fn test_falls_through_to_later_template() {
    let absent = textured(14, 10, 7);
    let present = textured(14, 10, 2);

    let mut capture = GrayImage::from_pixel(120, 60, Luma([30u8]));
    imageops::replace(&mut capture, &present, 60, 10);

    let actions = vec![
        Template::from_image("action-1", absent, DEFAULT_THRESHOLD),
        Template::from_image("action-2", present, DEFAULT_THRESHOLD),
    ];

    let dir = tempfile::tempdir().unwrap();
    let (index, template, result) = select_action(&capture, &actions, Some(dir.path())).unwrap();
    assert_eq!(index, 1);
    assert_eq!(template.label(), "action-2");
    assert_eq!(result.top_left, (60, 10));
    // Both templates were attempted, so both diagnostics exist.
    assert_eq!(debug_file_count(dir.path()), 2);
}

#[test]
fn test_exhausted_when_nothing_matches() {
    let capture = GrayImage::from_pixel(120, 60, Luma([30u8]));
    let actions = vec![
        Template::from_image("action-1", textured(14, 10, 1), DEFAULT_THRESHOLD),
        Template::from_image("action-2", textured(14, 10, 2), DEFAULT_THRESHOLD),
    ];

    assert!(select_action(&capture, &actions, None).is_none());
}
