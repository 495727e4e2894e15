// File-backed generators: eager one-shot load, trimmed lines, linear
// cycling.
use specimen::*;
use std::path::PathBuf;

struct TempLines {
    path: PathBuf,
}

impl TempLines {
    fn write(name: &str, contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("specimen-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        TempLines { path }
    }
}

impl Drop for TempLines {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[test]
fn file_cycle_wraps_like_a_sequence() {
    let lines = TempLines::write("cities.txt", "lisbon\nporto\nbraga\n");
    let template = Template::builder("office")
        .seed(Seed::from_u64(3))
        .field(
            "city",
            Generator::read_from_file(&lines.path, FileMode::Linear),
        )
        .build();

    let seen: Vec<Value> = (0..4).map(|_| template.make().unwrap().get("city")).collect();
    assert_eq!(
        seen,
        vec![
            Value::from("lisbon"),
            Value::from("porto"),
            Value::from("braga"),
            Value::from("lisbon"),
        ]
    );
}

#[test]
fn line_terminators_are_trimmed() {
    let lines = TempLines::write("crlf.txt", "one\r\ntwo\r\n");
    let template = Template::builder("crlf")
        .seed(Seed::from_u64(3))
        .field(
            "word",
            Generator::read_from_file(&lines.path, FileMode::Linear),
        )
        .build();

    assert_eq!(template.make().unwrap().get("word"), Value::from("one"));
    assert_eq!(template.make().unwrap().get("word"), Value::from("two"));
}

#[test]
fn missing_file_surfaces_a_read_error() {
    let template = Template::builder("ghost")
        .seed(Seed::from_u64(3))
        .field(
            "line",
            Generator::read_from_file("/nonexistent/specimen-missing.txt", FileMode::Linear),
        )
        .build();

    assert!(matches!(
        template.make(),
        Err(SpecimenError::FileRead { .. })
    ));
}

#[test]
fn empty_file_is_an_empty_choice() {
    let lines = TempLines::write("empty.txt", "");
    let template = Template::builder("empty")
        .seed(Seed::from_u64(3))
        .field(
            "line",
            Generator::read_from_file(&lines.path, FileMode::Linear),
        )
        .build();

    assert!(matches!(
        template.make(),
        Err(SpecimenError::EmptyChoice)
    ));
}
