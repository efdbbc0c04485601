use std::fs;

use shellkit_surface::{load_shell_dir, LoadError, LoaderConfig, Method};

#[test]
fn images_then_descriptors() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("surface0.png"), b"").expect("write");
    fs::write(dir.path().join("surface0010.png"), b"").expect("write");
    fs::write(
        dir.path().join("readme.txt"),
        b"surface99 { element0,base,x.png,0,0 }",
    )
    .expect("write");
    fs::write(
        dir.path().join("surfaces.txt"),
        "surface.append10\n{\n\telement1,overlay,eyes.png,3,4\n}\n",
    )
    .expect("write");
    fs::write(
        dir.path().join("surfaces2.txt"),
        "surface.append0,11\n{\n\telement1,overlay,mouth.png,0,0\n}\n",
    )
    .expect("write");

    let surfaces = load_shell_dir(dir.path(), &LoaderConfig::default()).expect("load");
    assert_eq!(surfaces.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![0, 10]);

    let s10 = surfaces.get(10).expect("surface 10");
    assert_eq!(s10.elements[&0].method, Method::Base);
    assert_eq!(s10.elements[&0].file, dir.path().join("surface0010.png"));
    assert_eq!(s10.elements[&1].file, dir.path().join("eyes.png"));
    assert_eq!(surfaces.get(0).expect("surface 0").elements.len(), 2);
}

#[test]
fn descriptor_may_overwrite_image_surface() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("surface3.png"), b"").expect("write");
    fs::write(
        dir.path().join("surfaces.txt"),
        "surface3 { element0,overlay,alt.png,1,2 }",
    )
    .expect("write");

    let surfaces = load_shell_dir(dir.path(), &LoaderConfig::default()).expect("load");
    let e = &surfaces.get(3).expect("surface 3").elements[&0];
    assert_eq!(e.method, Method::Overlay);
    assert_eq!(e.file, dir.path().join("alt.png"));
}

#[test]
fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    let err = load_shell_dir(&missing, &LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, LoadError::NotADirectory(p) if p == missing));
}
