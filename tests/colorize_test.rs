use deeplab_seg_rs::palette::{ClassColorTable, BLACK, BLUE, DOG, GREEN, PERSON, RED, SHEEP};
use deeplab_seg_rs::{argmax_classes, colorize, colorize_array, SegError};
use ndarray::Array3;

#[test]
fn test_single_cell_scenario() {
    let table = ClassColorTable::new(0xFF00_0000).with_class(1, 0xFF00_FF00);
    let pixels = colorize(&[0.1, 0.9, 0.2], 1, 1, 3, &table).unwrap();
    assert_eq!(pixels, vec![0xFF00_FF00]);
}

#[test]
fn test_tie_and_strict_win_scenario() {
    let table = ClassColorTable::new(0xFF00_0000).with_class(0, 0xFFAA_AAAA);
    let pixels = colorize(&[1.0, 2.0, 1.0, 0.5], 2, 1, 2, &table).unwrap();
    assert_eq!(pixels, vec![0xFFAA_AAAA, 0xFFAA_AAAA]);
}

#[test]
fn test_length_mismatch_is_invalid_argument() {
    let table = ClassColorTable::pascal_voc();
    let result = colorize(&[0.0; 7], 2, 2, 2, &table);
    assert!(matches!(result, Err(SegError::InvalidArgument { .. })));
}

#[test]
fn test_tie_prefers_lower_class_at_every_position() {
    // classes 1 and 2 tie everywhere above class 0
    let (width, height) = (4, 3);
    let plane = width * height;
    let mut scores = vec![0.0_f32; 3 * plane];
    scores[plane..].fill(7.0);

    let classes = argmax_classes(&scores, width, height, 3).unwrap();
    assert!(classes.iter().all(|&c| c == 1));
}

#[test]
fn test_pascal_voc_rendering() {
    // a 21 class map over a 4x1 strip: person, dog, sheep, cat
    let winners = [PERSON, DOG, SHEEP, 8];
    let scores = Array3::from_shape_fn((21, 1, 4), |(c, _, x)| {
        if c == winners[x] {
            3.0
        } else {
            -1.0
        }
    });

    let pixels = colorize_array(scores.view(), &ClassColorTable::pascal_voc()).unwrap();
    assert_eq!(pixels, vec![RED, GREEN, BLUE, BLACK]);
}

#[test]
fn test_large_grid_matches_sequential_scan() {
    let (width, height, num_classes) = (224, 224, 21);
    let scores: Vec<f32> = (0..width * height * num_classes)
        .map(|i| (((i as u64).wrapping_mul(2_654_435_761) >> 7) % 1000) as f32)
        .collect();
    let table = ClassColorTable::pascal_voc();

    let pixels = colorize(&scores, width, height, num_classes, &table).unwrap();

    let plane = width * height;
    for cell in (0..plane).step_by(97) {
        let mut best = 0;
        for class in 1..num_classes {
            if scores[class * plane + cell] > scores[best * plane + cell] {
                best = class;
            }
        }
        assert_eq!(pixels[cell], table.color_for(best), "cell {cell}");
    }
}
