identity_adapter!(v1_20_r4, NbtText, "Identity adapter for 1.20.5 and 1.20.6.");
