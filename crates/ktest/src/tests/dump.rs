use crate::*;

fn report(objects: Vec<KTestObject>) -> KTestReport {
    let ktest = KTest {
        args: vec![String::from("get_sign.json")],
        objects,
        ..Default::default()
    };
    KTestReport::new(&ktest, Some(String::from("test000002.ktest")))
}

#[test]
fn negative_int() {
    let report = report(vec![KTestObject::new("a", [0xff, 0xff, 0xff, 0xff])]);
    let object = &report.objects[0];
    assert_eq!(object.int, Some(-1));
    assert_eq!(object.uint, Some(0xffff_ffff));
    assert_eq!(object.hex, "0xffffffff");
    assert_eq!(object.data, "b'\\xff\\xff\\xff\\xff'");
    assert_eq!(object.text, "....");
}

#[test]
fn odd_sized_objects_have_no_integer_reading() {
    let report = report(vec![KTestObject::new("s", *b"abc")]);
    let object = &report.objects[0];
    assert_eq!(object.int, None);
    assert_eq!(object.uint, None);
    assert_eq!(object.text, "abc");
    assert_eq!(object.data, "b'abc'");
}

#[test]
fn display_layout() {
    let report = report(vec![KTestObject::new("a", [1, 0, 0, 0])]);
    let expected = "\
ktest file : 'test000002.ktest'
args       : ['get_sign.json']
num objects: 1
object 0: name: 'a'
object 0: size: 4
object 0: data: b'\\x01\\x00\\x00\\x00'
object 0: hex : 0x01000000
object 0: int : 1
object 0: uint: 1
object 0: text: ....
";
    assert_eq!(report.to_string(), expected);
}

#[test]
fn json_omits_missing_readings() {
    let report = report(vec![KTestObject::new("s", *b"abc")]);
    let json = serde_json::to_value(&report).expect("failed to serialize report");
    assert_eq!(json["objects"][0]["name"], "s");
    assert_eq!(json["objects"][0]["size"], 3);
    assert!(json["objects"][0].get("int").is_none());
    assert_eq!(json["file"], "test000002.ktest");
}
