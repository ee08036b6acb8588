//! Detector class vocabulary
//!
//! The detection engine reports class ids; this module maps them to the
//! COCO labels the model was trained on and provides [`LabelSet`] for the
//! labels a state is interested in.

/// COCO class labels in model output order
pub const COCO_LABELS: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Label for a class id, `None` for ids outside the vocabulary
pub fn label_for(class_id: u16) -> Option<&'static str> {
    COCO_LABELS.get(usize::from(class_id)).copied()
}

/// A small set of wanted labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSet(&'static [&'static str]);

impl LabelSet {
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self(labels)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.iter().any(|wanted| *wanted == label)
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.0
    }
}
