//! Hand-built model streams for the decoder tests.

#![allow(dead_code)]

use mmd_format::NO_BONE;
use mmd_format::codec::{encode_legacy_text, put_f32, put_fixed, put_u32};

pub const VERTEX_COUNT: usize = 3;
pub const VERTEX_SIZE: usize = 38;
/// Byte offset of the face index count in every stream built here.
pub const FACE_COUNT_OFFSET: usize = 283 + 4 + VERTEX_COUNT * VERTEX_SIZE;

pub struct TestBone {
    pub name: &'static str,
    pub parent: u16,
    pub position: [f32; 3],
}

pub struct TestRigidbody {
    pub name: &'static str,
    pub bone: u16,
    pub position: [f32; 3],
}

pub fn standard_bones() -> Vec<TestBone> {
    vec![
        TestBone {
            name: "センター",
            parent: NO_BONE,
            position: [0.0, 1.0, 0.0],
        },
        TestBone {
            name: "頭",
            parent: 0,
            position: [0.0, 5.0, 0.0],
        },
        TestBone {
            name: "右腕",
            parent: 0,
            position: [1.0, 4.0, 0.5],
        },
    ]
}

pub fn standard_rigidbodies() -> Vec<TestRigidbody> {
    vec![
        TestRigidbody {
            name: "頭",
            bone: 1,
            position: [0.0, 0.5, 0.0],
        },
        TestRigidbody {
            name: "free",
            bone: NO_BONE,
            position: [0.0, 0.0, 1.0],
        },
    ]
}

pub fn sample_model_bytes() -> Vec<u8> {
    build_model(&standard_bones(), &standard_rigidbodies())
}

pub fn build_model(bones: &[TestBone], rigidbodies: &[TestRigidbody]) -> Vec<u8> {
    let mut b = StreamBuilder::default();

    // header
    b.bytes(b"Pmd");
    b.f32(1.0);
    b.text("テスト", 20);
    b.text("comment", 256);

    // vertices
    b.u32(VERTEX_COUNT as u32);
    let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, -1.5]];
    for p in positions {
        b.vec3(p);
        b.vec3([0.0, 0.0, 1.0]);
        b.f32(0.25);
        b.f32(0.75);
        b.u16(0);
        b.u16(1);
        b.u8(100);
        b.u8(0);
    }

    // faces
    b.u32(3);
    b.u16(0);
    b.u16(1);
    b.u16(2);

    // materials
    b.u32(1);
    b.vec3([1.0, 0.5, 0.25]);
    b.f32(1.0);
    b.f32(5.0);
    b.vec3([0.1, 0.1, 0.1]);
    b.vec3([0.2, 0.2, 0.2]);
    b.u8(0);
    b.u8(1);
    b.u32(3);
    b.text("skin.png", 20);

    // bones
    b.u16(bones.len() as u16);
    for bone in bones {
        b.text(bone.name, 20);
        b.u16(bone.parent);
        b.u16(0);
        b.u8(0);
        b.u16(0);
        b.vec3(bone.position);
    }

    // IK chains
    b.u16(1);
    b.u16(2);
    b.u16(1);
    b.u8(1);
    b.u16(10);
    b.f32(0.5);
    b.u16(0);

    // morphs
    b.u16(2);
    b.text("base", 20);
    b.u32(2);
    b.u8(0);
    b.u32(1);
    b.vec3([1.0, 0.0, 0.0]);
    b.u32(2);
    b.vec3([0.0, 2.0, -1.5]);
    b.text("笑い", 20);
    b.u32(1);
    b.u8(1);
    b.u32(1);
    b.vec3([0.0, 0.25, 0.0]);

    // morph display
    b.u8(1);
    b.u16(1);

    // bone windows
    b.u8(1);
    b.text("体", 50);

    // bone display
    b.u32(1);
    b.u16(1);
    b.u8(1);

    // localization
    b.u8(1);
    b.text("Test", 20);
    b.text("english comment", 256);
    for i in 0..bones.len() {
        b.text(&format!("bone{}", i), 20);
    }
    b.text("smile", 20);
    b.text("Body", 50);

    // toon textures
    for i in 1..=10 {
        b.text(&format!("toon{:02}.bmp", i), 100);
    }

    // rigid bodies
    b.u32(rigidbodies.len() as u32);
    for rigid in rigidbodies {
        b.text(rigid.name, 20);
        b.u16(rigid.bone);
        b.u8(0);
        b.u16(0xFFFE);
        b.u8(0);
        b.vec3([0.5, 0.5, 0.5]);
        b.vec3(rigid.position);
        b.vec3([0.0, 0.0, 0.0]);
        b.f32(1.0);
        b.f32(0.5);
        b.f32(0.5);
        b.f32(0.0);
        b.f32(0.5);
        b.u8(1);
    }

    // joints
    b.u32(1);
    b.text("首", 20);
    b.u32(0);
    b.u32(1);
    b.vec3([0.0, 3.0, 0.0]);
    for _ in 0..7 {
        b.vec3([0.0, 0.0, 0.0]);
    }

    b.finish()
}

#[derive(Default)]
pub struct StreamBuilder {
    out: Vec<u8>,
}

impl StreamBuilder {
    pub fn bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    pub fn u8(&mut self, v: u8) {
        self.out.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        put_u32(&mut self.out, v);
    }

    pub fn f32(&mut self, v: f32) {
        put_f32(&mut self.out, v);
    }

    pub fn vec3(&mut self, v: [f32; 3]) {
        for c in v {
            self.f32(c);
        }
    }

    pub fn text(&mut self, text: &str, width: usize) {
        put_fixed(&mut self.out, &encode_legacy_text(text), width);
    }

    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
