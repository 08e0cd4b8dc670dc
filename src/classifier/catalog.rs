/// Disease labels in model output order. The classifier's argmax index is
/// looked up positionally, so this order must match the trained artifact.
pub const DISEASE_CLASSES: [&str; 23] = [
    "Apple___Apple_scab",
    "Apple___Black_rot",
    "Apple___Cedar_apple_rust",
    "Apple___healthy",
    "Blueberry___healthy",
    "Cherry_(including_sour)___Powdery_mildew",
    "Cherry_(including_sour)___healthy",
    "Corn_(maize)___Cercospora_leaf_spot Gray_leaf_spot",
    "Corn_(maize)___Common_rust_",
    "Corn_(maize)___Northern_Leaf_Blight",
    "Corn_(maize)___healthy",
    "Grape___Black_rot",
    "Grape___Esca_(Black_Measles)",
    "Grape___Leaf_blight_(Isariopsis_Leaf_Spot)",
    "Grape___healthy",
    "Orange___Haunglongbing_(Citrus_greening)",
    "Peach___Bacterial_spot",
    "Peach___healthy",
    "Pepper,_bell___Bacterial_spot",
    "Pepper,_bell___healthy",
    "Potato___Early_blight",
    "Potato___Late_blight",
    "Potato___healthy",
];

pub fn class_name(index: usize) -> Option<&'static str> {
    DISEASE_CLASSES.get(index).copied()
}

pub fn class_index(name: &str) -> Option<usize> {
    DISEASE_CLASSES.iter().position(|c| *c == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique() {
        for (i, name) in DISEASE_CLASSES.iter().enumerate() {
            assert_eq!(class_index(name), Some(i));
        }
    }

    #[test]
    fn lookup_out_of_range() {
        assert_eq!(class_name(22), Some("Potato___healthy"));
        assert_eq!(class_name(23), None);
        assert_eq!(class_index("Tomato___healthy"), None);
    }
}
